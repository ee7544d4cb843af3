//! Engine-wide error and configuration types.

use series_types::{LabelSetError, ParserType};
use thiserror::Error;

/// Errors that can occur while loading inputs, building ontologies or
/// writing results.
///
/// Data-quality problems are not errors: unresolved rules become the unknown
/// label and missing fields are skipped. Only I/O failures and structural
/// problems end up here.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Missing required column in an input table.
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// The name of the missing column.
        column: String,
    },

    /// The ontology violates a structural invariant. Always fatal.
    #[error("Ontology schema error: {0}")]
    Schema(String),

    /// Unknown ontology version name.
    #[error("Unknown ontology version: {name}")]
    UnknownOntology {
        /// The requested name.
        name: String,
    },

    /// Unknown model run name.
    #[error("Unknown model: {name}")]
    UnknownModel {
        /// The requested name.
        name: String,
    },

    /// Gold and predicted streams have different lengths.
    #[error("Misaligned streams: {gold} gold rows vs {predicted} predicted rows")]
    MisalignedStreams {
        /// Number of gold rows.
        gold: usize,
        /// Number of predicted rows.
        predicted: usize,
    },
}

impl From<LabelSetError> for ClassifyError {
    fn from(err: LabelSetError) -> Self {
        Self::Schema(err.to_string())
    }
}

/// Result type for engine operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Configuration for one classification pass.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Which rule set of each concept to apply.
    pub parser: ParserType,
    /// Whether to copy the series metadata into the output record.
    pub register_metadata: bool,
    /// Input columns copied into the output as `(source, target)`.
    pub passthrough: Vec<(String, String)>,
    /// Concepts whose diagnostics are logged at `info` instead of `debug`.
    pub traced_concepts: Vec<String>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            parser: ParserType::Llm,
            register_metadata: true,
            passthrough: Vec::new(),
            traced_concepts: Vec::new(),
        }
    }
}

impl ClassifyOptions {
    /// Options for a pass with the given parser type.
    pub fn for_parser(parser: ParserType) -> Self {
        Self {
            parser,
            ..Default::default()
        }
    }

    /// Options for classifying language-model responses.
    pub fn llm() -> Self {
        Self::for_parser(ParserType::Llm)
    }

    /// Options for the gold (manual) classification.
    pub fn manual() -> Self {
        Self::for_parser(ParserType::Manual)
    }

    /// Disables copying metadata into output records.
    pub fn without_metadata(mut self) -> Self {
        self.register_metadata = false;
        self
    }

    /// Copies each `source` column into the output under `prefix + source`.
    pub fn with_prefixed_passthrough<I, S>(mut self, columns: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.passthrough.extend(
            columns
                .into_iter()
                .map(|c| (c.as_ref().to_string(), format!("{}{}", prefix, c.as_ref()))),
        );
        self
    }

    /// Returns true if diagnostics of `concept` should be logged at `info`.
    pub fn is_traced(&self, concept: &str) -> bool {
        self.traced_concepts.iter().any(|c| c == concept)
    }
}

/// Configuration for printing an evaluation report.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Print the number of checked entries per concept.
    pub show_amount: bool,
    /// Print the share of checked entries per concept.
    pub show_amount_share: bool,
    /// Render confusion heatmaps.
    pub heatmaps: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            show_amount: true,
            show_amount_share: true,
            heatmaps: false,
        }
    }
}

impl EvalOptions {
    /// Options used when comparing a model against the gold annotation.
    pub fn model_comparison() -> Self {
        Self {
            show_amount: false,
            show_amount_share: false,
            heatmaps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_options_default() {
        let options = ClassifyOptions::default();
        assert_eq!(options.parser, ParserType::Llm);
        assert!(options.register_metadata);
        assert!(options.passthrough.is_empty());
    }

    #[test]
    fn test_prefixed_passthrough() {
        let options = ClassifyOptions::manual()
            .without_metadata()
            .with_prefixed_passthrough(["Series Description"], "_");

        assert_eq!(options.parser, ParserType::Manual);
        assert!(!options.register_metadata);
        assert_eq!(
            options.passthrough,
            vec![("Series Description".to_string(), "_Series Description".to_string())]
        );
    }

    #[test]
    fn test_label_set_error_is_schema_error() {
        let err: ClassifyError = LabelSetError::MissingUnknown.into();
        assert!(matches!(err, ClassifyError::Schema(_)));
    }

    #[test]
    fn test_eval_options() {
        assert!(EvalOptions::default().show_amount);
        assert!(EvalOptions::model_comparison().heatmaps);
    }
}
