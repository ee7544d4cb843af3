//! # series-classifier
//!
//! Ontology-driven classification of MRI/CT series, patient-level
//! aggregation and evaluation of model annotations against gold labels.
//!
//! ## Pipeline
//!
//! 1. [`reader::RowReader`] streams rows from a collection or prediction table.
//! 2. [`classify::Classifier`] applies one rule set of every concept of an
//!    [`Ontology`] and returns records plus [`ClassificationStats`].
//! 3. [`aggregate::patients`] counts, per patient, the series in each category.
//! 4. [`evaluation::EvaluationAccumulator`] pairs gold and predicted records
//!    and scores each concept with accuracy or macro F1.
//!
//! ## Features
//!
//! - `parallel`: classify rows on the rayon thread pool.
//!
//! ## Example
//!
//! ```rust
//! use series_classifier::{Classifier, ClassifyOptions, NoMetadata, Ontology};
//! use series_types::{Metadata, OntologyVersion};
//!
//! let ontology = Ontology::builtin(OntologyVersion::V21).unwrap();
//! let classifier = Classifier::new(&ontology, ClassifyOptions::llm());
//!
//! let mut row = Metadata::new();
//! row.insert("plane_type".into(), "This is an axial image.".into());
//!
//! let (record, _stats) = classifier.classify_row(&row, &NoMetadata);
//! assert_eq!(record.get("plane_type"), Some("axial"));
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod baseline;
pub mod chain;
pub mod classify;
pub mod evaluation;
pub mod metrics;
pub mod ontology;
pub mod reader;
pub mod registry;
pub mod render;
pub mod stats;
pub mod tokenizer;
pub mod tree;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use baseline::RandomBaseline;
pub use classify::{
    series_header, ClassificationPass, Classifier, MetadataSource, MetadataTable, NoMetadata, RowMetadata,
};
pub use evaluation::{ConceptScore, EvaluationAccumulator, EvaluationReport, MetaColumns};
pub use metrics::{ConfusionMatrix, MatrixView};
pub use ontology::Ontology;
pub use reader::RowReader;
pub use registry::{ModelRun, RunConfig};
pub use stats::{ClassificationStats, ConceptCounters};
pub use tokenizer::tokenize;
pub use types::{ClassifyError, ClassifyOptions, ClassifyResult, EvalOptions};

// Re-export series-types for convenience
pub use series_types;
