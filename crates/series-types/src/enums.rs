//! Enumeration types shared across the workspace.
//!
//! Each enum has a stable textual name used on the command line, in output
//! file names and in serialized ontologies.

use std::fmt;

/// Which rule set of a concept to apply.
///
/// # Examples
///
/// ```
/// use series_types::ParserType;
///
/// assert_eq!(ParserType::from_name("llm"), Some(ParserType::Llm));
/// assert_eq!(ParserType::Manual.name(), "manual");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParserType {
    /// Gold rules over DICOM metadata and series descriptions.
    Manual,
    /// Rules over free-text responses of a language model.
    Llm,
    /// Rules over raw DICOM tags only.
    Metadata,
}

impl ParserType {
    /// All parser types, in declaration order.
    pub const ALL: [ParserType; 3] = [Self::Manual, Self::Llm, Self::Metadata];

    /// Parses a parser type from its name.
    ///
    /// Returns `None` if the name is not recognized.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "manual" => Some(Self::Manual),
            "llm" => Some(Self::Llm),
            "metadata" => Some(Self::Metadata),
            _ => None,
        }
    }

    /// Returns the stable name of this parser type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Llm => "llm",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metric reported for a concept.
///
/// Concepts with a single known label are scored by accuracy; all others by
/// macro-averaged F1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    /// Exact positional match rate.
    Accuracy,
    /// Macro-averaged F1 over the declared labels.
    MacroF1,
}

impl MetricKind {
    /// Picks the metric for a concept with `known_labels` declared labels
    /// (excluding unknown).
    pub fn for_label_count(known_labels: usize) -> Self {
        if known_labels == 1 {
            Self::Accuracy
        } else {
            Self::MacroF1
        }
    }

    /// Short tag used in report lines.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Accuracy => "ACC",
            Self::MacroF1 => "F1",
        }
    }
}

/// Built-in ontology versions.
///
/// # Examples
///
/// ```
/// use series_types::OntologyVersion;
///
/// let v = OntologyVersion::from_name("v21").unwrap();
/// assert_eq!(v.name(), "ontology-v21");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OntologyVersion {
    /// Separate DWI/ADC concepts.
    V20,
    /// DWI/ADC folded into the weighting concept.
    V21,
}

impl OntologyVersion {
    /// Parses a version from `v20`/`v21` or the full `ontology-v20` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches("ontology-") {
            "v20" => Some(Self::V20),
            "v21" => Some(Self::V21),
            _ => None,
        }
    }

    /// Returns the ontology name, also used as the output sub-directory.
    pub fn name(self) -> &'static str {
        match self {
            Self::V20 => "ontology-v20",
            Self::V21 => "ontology-v21",
        }
    }
}

impl fmt::Display for OntologyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
