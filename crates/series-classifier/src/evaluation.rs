//! Gold-versus-prediction evaluation.
//!
//! An [`EvaluationAccumulator`] consumes gold and predicted series records in
//! lockstep and keeps, per concept, two positionally aligned label lists.
//! A concept contributes a pair only when the gold label is known and the
//! prediction has the concept at all; both lists always grow together.

use std::collections::BTreeMap;
use std::fmt;

use series_types::{is_unknown, MetricKind, SeriesRecord, UNKNOWN};
use tracing::info;

use crate::metrics::{self, ConfusionMatrix};
use crate::ontology::Ontology;
use crate::types::{ClassifyError, ClassifyResult};

/// Columns whose values are kept alongside each pair for error analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaColumns {
    /// Gold-side columns, joined with `:`.
    pub gold: Vec<String>,
    /// Prefix of the predicted-side column; the concept key is appended.
    pub predicted_prefix: String,
}

impl MetaColumns {
    /// Gold descriptions plus the raw model response, both under the `_`
    /// passthrough prefix.
    pub fn passthrough<S: AsRef<str>>(gold_columns: &[S]) -> Self {
        Self {
            gold: gold_columns.iter().map(|c| format!("_{}", c.as_ref())).collect(),
            predicted_prefix: "_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ConceptPairs {
    gold: Vec<String>,
    predicted: Vec<String>,
    gold_meta: Vec<String>,
    predicted_meta: Vec<String>,
}

/// Collects aligned gold/predicted label lists per concept.
#[derive(Debug, Clone, Default)]
pub struct EvaluationAccumulator {
    pairs: BTreeMap<String, ConceptPairs>,
    entries_total: usize,
    meta: Option<MetaColumns>,
}

impl EvaluationAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator that also keeps meta text for error analysis.
    pub fn with_meta(meta: MetaColumns) -> Self {
        Self {
            meta: Some(meta),
            ..Self::default()
        }
    }

    /// Records one gold/predicted pair of series.
    pub fn observe(&mut self, ontology: &Ontology, gold: &SeriesRecord, predicted: &SeriesRecord) {
        for key in ontology.concept_keys() {
            let Some(gold_label) = gold.get(key) else {
                continue;
            };
            if is_unknown(gold_label) {
                continue;
            }
            let Some(predicted_label) = predicted.get(key) else {
                continue;
            };

            let pairs = self.pairs.entry(key.to_string()).or_default();
            pairs.gold.push(gold_label.to_string());
            pairs.predicted.push(predicted_label.to_string());

            if let Some(meta) = &self.meta {
                let gold_text: Vec<&str> = meta
                    .gold
                    .iter()
                    .map(|column| gold.get(column).unwrap_or(""))
                    .collect();
                pairs.gold_meta.push(gold_text.join(":"));
                let response_column = format!("{}{}", meta.predicted_prefix, key);
                pairs
                    .predicted_meta
                    .push(predicted.get(&response_column).unwrap_or("").to_string());
            }
        }
        self.entries_total += 1;
    }

    /// Consumes two record streams in lockstep.
    ///
    /// # Errors
    /// Returns [`ClassifyError::MisalignedStreams`] if one stream ends before
    /// the other. Pairs seen before the mismatch are kept.
    pub fn observe_streams<G, P>(&mut self, ontology: &Ontology, gold: G, predicted: P) -> ClassifyResult<()>
    where
        G: IntoIterator<Item = SeriesRecord>,
        P: IntoIterator<Item = SeriesRecord>,
    {
        let mut gold = gold.into_iter();
        let mut predicted = predicted.into_iter();
        let mut seen = 0usize;

        loop {
            match (gold.next(), predicted.next()) {
                (Some(g), Some(p)) => {
                    self.observe(ontology, &g, &p);
                    seen += 1;
                }
                (None, None) => return Ok(()),
                (Some(_), None) => {
                    return Err(ClassifyError::MisalignedStreams {
                        gold: seen + 1 + gold.count(),
                        predicted: seen,
                    })
                }
                (None, Some(_)) => {
                    return Err(ClassifyError::MisalignedStreams {
                        gold: seen,
                        predicted: seen + 1 + predicted.count(),
                    })
                }
            }
        }
    }

    /// Number of observed pairs of series.
    pub fn entries_total(&self) -> usize {
        self.entries_total
    }

    /// Gold labels collected for a concept.
    pub fn gold(&self, key: &str) -> &[String] {
        self.pairs.get(key).map(|p| p.gold.as_slice()).unwrap_or(&[])
    }

    /// Predicted labels collected for a concept.
    pub fn predicted(&self, key: &str) -> &[String] {
        self.pairs.get(key).map(|p| p.predicted.as_slice()).unwrap_or(&[])
    }

    /// Scores every concept with a label set.
    pub fn evaluate(&self, ontology: &Ontology) -> EvaluationReport {
        let scores = ontology
            .concepts()
            .iter()
            .filter_map(|concept| {
                let labels = concept.labels.as_ref()?.labels(false);
                Some(self.score(&concept.key, &labels))
            })
            .collect();

        let report = EvaluationReport {
            entries_total: self.entries_total,
            scores,
            header: ontology.full_header().to_vec(),
        };
        info!(entries = report.entries_total, concepts = report.scores.len(), "evaluation finished");
        report
    }

    fn score(&self, key: &str, labels: &[String]) -> ConceptScore {
        let gold = self.gold(key);
        let predicted = self.predicted(key);
        let metric = MetricKind::for_label_count(labels.len());
        let value = match metric {
            MetricKind::Accuracy => metrics::accuracy(gold, predicted),
            MetricKind::MacroF1 if gold.is_empty() => None,
            MetricKind::MacroF1 => Some(metrics::macro_f1(gold, predicted, labels)),
        };

        ConceptScore {
            key: key.to_string(),
            metric,
            value,
            actual_labels: metrics::actual_labels(labels, gold, predicted),
            checked: gold.len(),
            missed: metrics::missed_rate(predicted),
        }
    }

    /// Confusion matrix of a concept over its actual labels plus unknown.
    pub fn confusion(&self, ontology: &Ontology, key: &str) -> Option<ConfusionMatrix> {
        let labels = ontology.labels_for(key, false)?;
        let gold = self.gold(key);
        let predicted = self.predicted(key);
        let mut classes = metrics::actual_labels(&labels, gold, predicted);
        classes.push(UNKNOWN.to_string());
        Some(ConfusionMatrix::new(gold, predicted, &classes))
    }

    /// Lines describing every mismatched pair of a concept.
    ///
    /// Empty for concepts without a label set.
    pub fn error_listing(&self, ontology: &Ontology, key: &str) -> Vec<String> {
        if ontology.labels_for(key, false).is_none() {
            return Vec::new();
        }
        let Some(pairs) = self.pairs.get(key) else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        for (i, (gold, predicted)) in pairs.gold.iter().zip(&pairs.predicted).enumerate() {
            if gold == predicted {
                continue;
            }
            let gold_meta = pairs.gold_meta.get(i).map_or("", String::as_str);
            let response = pairs
                .predicted_meta
                .get(i)
                .map_or(String::new(), |text| text.replace('\n', " "));
            lines.push(format!("{}: `{}` ({}) predicted as `{}`", i, gold_meta, gold, predicted));
            lines.push(format!("\tResponse: {}", response));
        }
        lines
    }
}

// =============================================================================
// Report
// =============================================================================

/// Score of one concept.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptScore {
    /// Concept key.
    pub key: String,
    /// Metric used.
    pub metric: MetricKind,
    /// Metric value; `None` when no gold label was collected.
    pub value: Option<f64>,
    /// Declared labels seen in gold or prediction.
    pub actual_labels: Vec<String>,
    /// Number of evaluated pairs.
    pub checked: usize,
    /// Share of unknown predictions; `None` without predictions.
    pub missed: Option<f64>,
}

impl ConceptScore {
    /// Percentage of entries that were evaluated for this concept.
    pub fn coverage(&self, entries_total: usize) -> Option<f64> {
        if entries_total == 0 {
            None
        } else {
            Some(100.0 * self.checked as f64 / entries_total as f64)
        }
    }

    /// One human-readable report line.
    pub fn line(&self, entries_total: usize) -> String {
        format!(
            "{}({}) ([{}]): {} [checked: {}/{}, {}%]",
            self.metric.tag(),
            self.key,
            self.actual_labels.join(", "),
            fixed(self.value, 2),
            self.checked,
            entries_total,
            fixed(self.coverage(entries_total), 2)
        )
    }
}

/// Scores of all evaluated concepts.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Number of observed pairs of series.
    pub entries_total: usize,
    /// Scores in concept order.
    pub scores: Vec<ConceptScore>,
    header: Vec<String>,
}

impl EvaluationReport {
    /// Looks up the score of a concept.
    pub fn score(&self, key: &str) -> Option<&ConceptScore> {
        self.scores.iter().find(|s| s.key == key)
    }

    /// One line per concept.
    pub fn lines(&self) -> Vec<String> {
        self.scores.iter().map(|s| s.line(self.entries_total)).collect()
    }

    /// Tab-separated lines in header order, for pasting into a spreadsheet:
    /// metric values, missed rates, then optionally checked counts and
    /// checked percentages. Missing values are written as `-1`.
    pub fn spreadsheet_lines(&self, show_amount: bool, show_amount_share: bool) -> Vec<String> {
        let by_column = |f: &dyn Fn(&ConceptScore) -> String, missing: &str| -> String {
            format_line(self.header.iter().map(|column| {
                self.score(column).map_or_else(|| missing.to_string(), f)
            }))
        };

        let mut lines = vec![
            by_column(&|s: &ConceptScore| rounded(s.value), "-1"),
            by_column(&|s: &ConceptScore| rounded(s.missed), "-1"),
        ];
        if show_amount {
            lines.push(by_column(&|s: &ConceptScore| s.checked.to_string(), "0"));
        }
        if show_amount_share {
            let total = self.entries_total;
            lines.push(by_column(&|s: &ConceptScore| fixed(s.coverage(total), 1), "0.0"));
        }
        lines
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Joins cells with tabs.
pub fn format_line<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| c.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", decimals, v))
}

fn rounded(value: Option<f64>) -> String {
    value.map_or_else(|| "-1".to_string(), |v| ((v * 100.0).round() / 100.0).to_string())
}
