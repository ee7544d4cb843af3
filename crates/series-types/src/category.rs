//! Series-to-patient category rules.
//!
//! A category is a named conjunction of label conditions over a classified
//! series. Applied to all series of one patient, it selects a sub-list whose
//! size becomes a patient-level feature.

use crate::SeriesRecord;

/// A single label test on one concept column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Condition {
    /// The field is present and equals the label.
    Is {
        /// Concept key.
        field: String,
        /// Expected label.
        label: String,
    },
    /// The field is absent or differs from the label.
    IsNot {
        /// Concept key.
        field: String,
        /// Rejected label.
        label: String,
    },
}

impl Condition {
    /// `field == label`.
    pub fn is(field: &str, label: &str) -> Self {
        Self::Is {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    /// `field != label` (absent fields pass).
    pub fn is_not(field: &str, label: &str) -> Self {
        Self::IsNot {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    /// Tests a classified series.
    pub fn holds(&self, series: &SeriesRecord) -> bool {
        match self {
            Self::Is { field, label } => series.get(field) == Some(label.as_str()),
            Self::IsNot { field, label } => series.get(field) != Some(label.as_str()),
        }
    }
}

/// A named series filter.
///
/// # Examples
///
/// ```
/// use series_types::{CategoryRule, Condition, SeriesRecord};
///
/// let coronal = CategoryRule::new("cor", vec![Condition::is("plane_type", "coronal")]);
///
/// let series: Vec<SeriesRecord> = vec![
///     [("plane_type", "coronal")].into_iter().collect(),
///     [("plane_type", "axial")].into_iter().collect(),
/// ];
/// assert_eq!(coronal.count(&series), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryRule {
    /// Output column name.
    pub name: String,
    /// Conditions that must all hold.
    pub conditions: Vec<Condition>,
}

impl CategoryRule {
    /// Creates a category.
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            conditions,
        }
    }

    /// Returns true if every condition holds for the series.
    pub fn matches(&self, series: &SeriesRecord) -> bool {
        self.conditions.iter().all(|c| c.holds(series))
    }

    /// Selects the matching series, preserving order.
    pub fn select<'a>(&self, series: &'a [SeriesRecord]) -> Vec<&'a SeriesRecord> {
        series.iter().filter(|s| self.matches(s)).collect()
    }

    /// Number of matching series.
    pub fn count(&self, series: &[SeriesRecord]) -> usize {
        series.iter().filter(|s| self.matches(s)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(&str, &str)]) -> SeriesRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_is_not_accepts_missing_field() {
        let record = series(&[("weight_t", "t1")]);
        assert!(Condition::is_not("is_fs", "+").holds(&record));
        assert!(!Condition::is("is_fs", "+").holds(&record));
    }

    #[test]
    fn test_select_preserves_order() {
        let rule = CategoryRule::new(
            "ax-t1",
            vec![
                Condition::is("plane_type", "axial"),
                Condition::is("weight_t", "t1"),
                Condition::is_not("is_fs", "+"),
            ],
        );
        let records = vec![
            series(&[("plane_type", "axial"), ("weight_t", "t1"), ("ID-Series", "1")]),
            series(&[("plane_type", "axial"), ("weight_t", "t1"), ("is_fs", "+")]),
            series(&[("plane_type", "axial"), ("weight_t", "t1"), ("ID-Series", "3")]),
            series(&[("plane_type", "coronal"), ("weight_t", "t1")]),
        ];

        let selected = rule.select(&records);
        let ids: Vec<_> = selected.iter().map(|s| s.get("ID-Series")).collect();
        assert_eq!(ids, vec![Some("1"), Some("3")]);
        assert_eq!(rule.count(&records), 2);
    }
}
