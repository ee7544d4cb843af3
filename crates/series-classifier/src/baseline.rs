//! Random-label baseline.
//!
//! Predicts, for every concept with a label set, one of its known labels
//! uniformly at random. Scored with the same accumulator as a model run, it
//! gives the floor a model has to beat.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use series_types::SeriesRecord;

use crate::evaluation::EvaluationAccumulator;
use crate::ontology::Ontology;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Seeded random predictor.
#[derive(Debug, Clone)]
pub struct RandomBaseline {
    rng: StdRng,
}

impl Default for RandomBaseline {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RandomBaseline {
    /// Creates a predictor with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Predicts one record.
    pub fn predict(&mut self, ontology: &Ontology) -> SeriesRecord {
        let mut record = SeriesRecord::new();
        for concept in ontology.concepts() {
            let Some(labels) = &concept.labels else {
                continue;
            };
            if let Some(label) = labels.known().choose(&mut self.rng) {
                record.insert(concept.key.clone(), *label);
            }
        }
        record
    }

    /// Predicts one record per gold record and accumulates the pairs.
    pub fn evaluate<'g, I>(&mut self, ontology: &Ontology, gold: I) -> EvaluationAccumulator
    where
        I: IntoIterator<Item = &'g SeriesRecord>,
    {
        let mut acc = EvaluationAccumulator::new();
        for record in gold {
            let predicted = self.predict(ontology);
            acc.observe(ontology, record, &predicted);
        }
        acc
    }
}
