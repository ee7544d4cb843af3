//! Classification label type.
//!
//! Labels are short strings such as `"axial"`, `"t1"` or `"+"`. Every
//! concept shares the same sentinel for "no rule committed".

/// A categorical label produced by a rule set.
///
/// # Examples
///
/// ```
/// use series_types::{Label, UNKNOWN};
///
/// let plane: Label = "axial".to_string();
/// assert_ne!(plane, UNKNOWN);
/// ```
pub type Label = String;

/// Sentinel label meaning "no rule committed".
///
/// An unknown outcome is an abstention, not a wrong answer: evaluation counts
/// it separately from correct and incorrect predictions.
pub const UNKNOWN: &str = "?";

/// Returns true if `label` is the [`UNKNOWN`] sentinel.
pub fn is_unknown(label: &str) -> bool {
    label == UNKNOWN
}
