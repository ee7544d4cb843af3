//! Concept type.
//!
//! A concept is one classification axis (plane, weighting, contrast timing,
//! ...). It carries an independent rule set per [`ParserType`] and the finite
//! set of labels it may produce.

use std::fmt;

use crate::{ParserType, PatternTree, RuleChain, UNKNOWN};

/// The declared evaluation method of a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Matcher {
    /// First-match-wins rule chain.
    RuleChain(RuleChain),
    /// State-machine walk over free text.
    PatternTree(PatternTree),
}

impl Matcher {
    /// Short name of the method.
    pub fn method(&self) -> &'static str {
        match self {
            Self::RuleChain(_) => "rule_chain",
            Self::PatternTree(_) => "pattern_tree",
        }
    }
}

/// Error raised when a label set does not satisfy its invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSetError {
    /// The set does not contain the unknown sentinel.
    MissingUnknown,
    /// A label appears twice.
    Duplicate(String),
}

impl fmt::Display for LabelSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUnknown => write!(f, "label set must contain '{}'", UNKNOWN),
            Self::Duplicate(label) => write!(f, "duplicate label '{}'", label),
        }
    }
}

impl std::error::Error for LabelSetError {}

/// An ordered label set that always contains [`UNKNOWN`].
///
/// # Examples
///
/// ```
/// use series_types::{LabelSet, UNKNOWN};
///
/// let labels = LabelSet::new(["t1", "t2", UNKNOWN]).unwrap();
/// assert_eq!(labels.known(), vec!["t1", "t2"]);
/// assert!(LabelSet::new(["t1", "t2"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<String>", into = "Vec<String>")
)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Creates a label set, checking that it contains [`UNKNOWN`] and has no
    /// duplicates.
    pub fn new<I, S>(labels: I) -> Result<Self, LabelSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(LabelSetError::Duplicate(label.clone()));
            }
        }
        if !labels.iter().any(|l| l == UNKNOWN) {
            return Err(LabelSetError::MissingUnknown);
        }
        Ok(Self { labels })
    }

    /// All labels in declaration order, optionally without [`UNKNOWN`].
    pub fn labels(&self, keep_unknown: bool) -> Vec<String> {
        self.labels
            .iter()
            .filter(|l| keep_unknown || l.as_str() != UNKNOWN)
            .cloned()
            .collect()
    }

    /// Labels other than [`UNKNOWN`].
    pub fn known(&self) -> Vec<&str> {
        self.labels
            .iter()
            .map(String::as_str)
            .filter(|l| *l != UNKNOWN)
            .collect()
    }

    /// Returns true if the label is declared.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Returns a copy with `labels` inserted before the unknown sentinel.
    pub fn extend_before_unknown(&self, labels: &[&str]) -> Result<Self, LabelSetError> {
        let mut out: Vec<String> = self
            .labels
            .iter()
            .filter(|l| l.as_str() != UNKNOWN)
            .cloned()
            .collect();
        out.extend(labels.iter().map(|l| l.to_string()));
        out.push(UNKNOWN.to_string());
        Self::new(out)
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = LabelSetError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.labels
    }
}

/// A named classification axis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concept {
    /// Unique key, also the output column name.
    pub key: String,
    /// Rules over metadata and series descriptions.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub manual: Option<Matcher>,
    /// Rules over language-model responses.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub llm: Option<Matcher>,
    /// Rules over raw DICOM tags only.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub metadata: Option<Matcher>,
    /// Declared labels; `None` excludes the concept from evaluation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub labels: Option<LabelSet>,
}

impl Concept {
    /// Creates a concept with no rule sets.
    pub fn new(key: impl Into<String>, labels: Option<LabelSet>) -> Self {
        Self {
            key: key.into(),
            manual: None,
            llm: None,
            metadata: None,
            labels,
        }
    }

    /// Sets the manual rule set.
    pub fn with_manual(mut self, matcher: Matcher) -> Self {
        self.manual = Some(matcher);
        self
    }

    /// Sets the language-model rule set.
    pub fn with_llm(mut self, matcher: Matcher) -> Self {
        self.llm = Some(matcher);
        self
    }

    /// Sets the metadata-only rule set.
    pub fn with_metadata(mut self, matcher: Matcher) -> Self {
        self.metadata = Some(matcher);
        self
    }

    /// Returns the rule set for a parser type.
    pub fn matcher(&self, parser: ParserType) -> Option<&Matcher> {
        match parser {
            ParserType::Manual => self.manual.as_ref(),
            ParserType::Llm => self.llm.as_ref(),
            ParserType::Metadata => self.metadata.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Predicate, Rule};

    #[test]
    fn test_label_set_invariants() {
        assert_eq!(
            LabelSet::new(["+", "."]).unwrap_err(),
            LabelSetError::MissingUnknown
        );
        assert_eq!(
            LabelSet::new(["+", "+", UNKNOWN]).unwrap_err(),
            LabelSetError::Duplicate("+".to_string())
        );
    }

    #[test]
    fn test_label_set_extend_before_unknown() {
        let base = LabelSet::new(["t1", "t2", UNKNOWN]).unwrap();
        let extended = base.extend_before_unknown(&["DWI", "ADC"]).unwrap();

        assert_eq!(extended.labels(true), vec!["t1", "t2", "DWI", "ADC", UNKNOWN]);
        assert_eq!(extended.labels(false), vec!["t1", "t2", "DWI", "ADC"]);
        assert!(base.extend_before_unknown(&["t1"]).is_err());
    }

    #[test]
    fn test_concept_matcher_by_parser() {
        let chain = RuleChain::new(vec![Rule::catch_all(UNKNOWN)]);
        let concept = Concept::new("is_fs", Some(LabelSet::new(["+", UNKNOWN]).unwrap()))
            .with_manual(Matcher::RuleChain(chain.clone()))
            .with_llm(Matcher::RuleChain(RuleChain::new(vec![Rule::new(
                Predicate::text_any(&["yes"]),
                "+",
            )])));

        assert_eq!(
            concept.matcher(ParserType::Manual),
            Some(&Matcher::RuleChain(chain))
        );
        assert!(concept.matcher(ParserType::Llm).is_some());
        assert!(concept.matcher(ParserType::Metadata).is_none());
        assert_eq!(concept.matcher(ParserType::Llm).unwrap().method(), "rule_chain");
    }
}
