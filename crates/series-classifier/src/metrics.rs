//! Agreement metrics between gold and predicted label lists.
//!
//! All functions take positionally aligned slices: `gold[i]` and
//! `predicted[i]` describe the same series.

use series_types::is_unknown;

/// Share of positions where prediction equals gold.
///
/// Returns `None` for an empty gold list.
pub fn accuracy<S: AsRef<str>>(gold: &[S], predicted: &[S]) -> Option<f64> {
    if gold.is_empty() {
        return None;
    }
    let hits = gold
        .iter()
        .zip(predicted)
        .filter(|(g, p)| g.as_ref() == p.as_ref())
        .count();
    Some(hits as f64 / gold.len() as f64)
}

/// Unweighted mean of per-label F1 over `labels`.
///
/// A label that never occurs in gold or prediction scores 0. Predictions
/// outside `labels` (for example unknown) count as misses for the gold label.
///
/// # Examples
///
/// ```
/// use series_classifier::metrics::macro_f1;
///
/// let gold = ["+", "+", "."];
/// let predicted = ["+", ".", "."];
/// let f1 = macro_f1(&gold, &predicted, &["+", "."]);
/// assert!((f1 - 2.0 / 3.0).abs() < 1e-9);
/// ```
pub fn macro_f1<S: AsRef<str>, L: AsRef<str>>(gold: &[S], predicted: &[S], labels: &[L]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = labels.iter().map(|label| f1(gold, predicted, label.as_ref())).sum();
    total / labels.len() as f64
}

fn f1<S: AsRef<str>>(gold: &[S], predicted: &[S], label: &str) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (g, p) in gold.iter().zip(predicted) {
        let (g, p) = (g.as_ref() == label, p.as_ref() == label);
        match (g, p) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denominator = 2 * tp + fp + fn_;
    if denominator == 0 {
        0.0
    } else {
        2.0 * tp as f64 / denominator as f64
    }
}

/// Share of predictions that are unknown. `None` without predictions.
pub fn missed_rate<S: AsRef<str>>(predicted: &[S]) -> Option<f64> {
    if predicted.is_empty() {
        return None;
    }
    let missed = predicted.iter().filter(|p| is_unknown(p.as_ref())).count();
    Some(missed as f64 / predicted.len() as f64)
}

/// Declared labels that occur in gold or prediction, in declaration order.
pub fn actual_labels<L: AsRef<str>, S: AsRef<str>>(labels: &[L], gold: &[S], predicted: &[S]) -> Vec<String> {
    labels
        .iter()
        .map(|label| label.as_ref())
        .filter(|label| {
            gold.iter().any(|g| g.as_ref() == *label) || predicted.iter().any(|p| p.as_ref() == *label)
        })
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Confusion matrix
// =============================================================================

/// Counts of `(gold, predicted)` pairs over a fixed class list.
///
/// Rows are gold classes, columns predicted classes. Pairs involving a label
/// outside the class list are not counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    counts: Vec<Vec<usize>>,
    skipped: usize,
}

impl ConfusionMatrix {
    /// Builds the matrix of `gold` against `predicted`.
    pub fn new<S: AsRef<str>, C: AsRef<str>>(gold: &[S], predicted: &[S], classes: &[C]) -> Self {
        let classes: Vec<String> = classes.iter().map(|c| c.as_ref().to_string()).collect();
        let mut counts = vec![vec![0usize; classes.len()]; classes.len()];
        let mut skipped = 0;

        let position = |label: &str| classes.iter().position(|c| c == label);
        for (g, p) in gold.iter().zip(predicted) {
            match (position(g.as_ref()), position(p.as_ref())) {
                (Some(row), Some(col)) => counts[row][col] += 1,
                _ => skipped += 1,
            }
        }

        Self {
            classes,
            counts,
            skipped,
        }
    }

    /// Class labels, in row/column order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Count for a `(gold, predicted)` pair of class indices.
    pub fn get(&self, row: usize, col: usize) -> usize {
        self.counts
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0)
    }

    /// Raw counts.
    pub fn counts(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// Number of pairs that fell outside the class list.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Total number of counted pairs.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Counts min-max scaled to `[0, 1]` over the whole matrix and rounded
    /// to two decimals. A constant matrix scales to zeros.
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        let min = self.counts.iter().flatten().copied().min().unwrap_or(0);
        let max = self.counts.iter().flatten().copied().max().unwrap_or(0);
        let range = (max - min) as f64;
        self.counts
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&c| {
                        if range == 0.0 {
                            0.0
                        } else {
                            round2((c - min) as f64 / range)
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Values of the rows and columns of `visible`, in that order. Scaling
    /// (when `normalize` is set) is computed over the full matrix first.
    /// Classes not in the matrix are left out.
    pub fn restrict<C: AsRef<str>>(&self, visible: &[C], normalize: bool) -> MatrixView {
        let values: Vec<Vec<f64>> = if normalize {
            self.normalized()
        } else {
            self.counts
                .iter()
                .map(|row| row.iter().map(|&c| c as f64).collect())
                .collect()
        };

        let picked: Vec<(String, usize)> = visible
            .iter()
            .filter_map(|label| {
                let label = label.as_ref();
                self.classes
                    .iter()
                    .position(|c| c == label)
                    .map(|i| (label.to_string(), i))
            })
            .collect();

        MatrixView {
            values: picked
                .iter()
                .map(|(_, row)| picked.iter().map(|(_, col)| values[*row][*col]).collect())
                .collect(),
            classes: picked.into_iter().map(|(label, _)| label).collect(),
            normalized: normalize,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A square slice of a confusion matrix, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixView {
    /// Class labels, in row/column order.
    pub classes: Vec<String>,
    /// Cell values.
    pub values: Vec<Vec<f64>>,
    /// Whether values are min-max scaled.
    pub normalized: bool,
}

impl MatrixView {
    /// Returns true if the view has no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Largest cell value, or 0 for an empty view.
    pub fn max(&self) -> f64 {
        self.values.iter().flatten().copied().fold(0.0, f64::max)
    }
}
