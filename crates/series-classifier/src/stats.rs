//! Label counters collected during a classification pass.
//!
//! Counters are plain values: each pass (or each worker of a parallel
//! pass) fills its own and the results are merged.

use std::collections::BTreeMap;

use series_types::is_unknown;

/// Label counts for the concepts of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptCounters {
    labels: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ConceptCounters {
    /// Records one label for a concept.
    pub fn observe(&mut self, concept: &str, label: &str) {
        *self
            .labels
            .entry(concept.to_string())
            .or_default()
            .entry(label.to_string())
            .or_insert(0) += 1;
    }

    /// Adds all counts of `other`.
    pub fn merge(&mut self, other: &ConceptCounters) {
        for (concept, labels) in &other.labels {
            let target = self.labels.entry(concept.clone()).or_default();
            for (label, count) in labels {
                *target.entry(label.clone()).or_insert(0) += count;
            }
        }
    }

    /// Concepts with at least one observation.
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    /// Number of observations of a concept.
    pub fn total(&self, concept: &str) -> usize {
        self.labels.get(concept).map_or(0, |l| l.values().sum())
    }

    /// Number of unknown labels of a concept.
    pub fn unknown(&self, concept: &str) -> usize {
        self.labels
            .get(concept)
            .map_or(0, |l| l.iter().filter(|(k, _)| is_unknown(k)).map(|(_, v)| v).sum())
    }

    /// Number of known labels of a concept.
    pub fn known(&self, concept: &str) -> usize {
        self.total(concept) - self.unknown(concept)
    }

    /// Percentage of unknown labels, `None` without observations.
    pub fn unknown_rate(&self, concept: &str) -> Option<f64> {
        percentage(self.unknown(concept), self.total(concept))
    }

    /// Percentage of known labels, `None` without observations.
    pub fn known_rate(&self, concept: &str) -> Option<f64> {
        percentage(self.known(concept), self.total(concept))
    }

    /// Share of each known label among the known labels, in percent.
    pub fn label_distribution(&self, concept: &str) -> Vec<(String, f64)> {
        let known = self.known(concept);
        self.labels
            .get(concept)
            .map(|labels| {
                labels
                    .iter()
                    .filter(|(label, _)| !is_unknown(label))
                    .filter_map(|(label, count)| percentage(*count, known).map(|p| (label.clone(), p)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Per-collection counters for a classification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    collections: BTreeMap<String, ConceptCounters>,
    rows: usize,
}

impl ClassificationStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one label for a concept of a collection.
    pub fn observe(&mut self, collection: &str, concept: &str, label: &str) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .observe(concept, label);
    }

    /// Counts one classified row.
    pub fn count_row(&mut self) {
        self.rows += 1;
    }

    /// Number of classified rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Adds all counts of `other`.
    pub fn merge(mut self, other: ClassificationStats) -> Self {
        for (collection, counters) in &other.collections {
            self.collections
                .entry(collection.clone())
                .or_default()
                .merge(counters);
        }
        self.rows += other.rows;
        self
    }

    /// Counters of each collection.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &ConceptCounters)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Counters summed over all collections.
    pub fn overall(&self) -> ConceptCounters {
        let mut total = ConceptCounters::default();
        for counters in self.collections.values() {
            total.merge(counters);
        }
        total
    }

    /// `(concept, unknown, total)` per concept, most unknowns first.
    pub fn error_summary(&self) -> Vec<(String, usize, usize)> {
        let overall = self.overall();
        let mut summary: Vec<(String, usize, usize)> = overall
            .concepts()
            .map(|c| (c.to_string(), overall.unknown(c), overall.total(c)))
            .collect();
        summary.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        summary
    }
}

fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(100.0 * part as f64 / whole as f64)
    }
}
