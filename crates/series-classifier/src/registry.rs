//! Model runs and file locations.
//!
//! A model run names a CSV of language-model responses and the ontology
//! version its prompts were written for. [`RunConfig`] resolves where input
//! tables live and where every output file of a run goes.

use std::env;
use std::path::{Path, PathBuf};

use series_types::OntologyVersion;

use crate::types::{ClassifyError, ClassifyResult};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SERIES_DATA_DIR";

/// Data directory used when neither a flag nor the environment sets one.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Collection table used when none is given.
pub const DEFAULT_COLLECTION: &str = "datasets/tcia_series_narratives/collection.csv";

/// Model run evaluated when none is given.
pub const DEFAULT_MODEL: &str = "chat-gpt-4-v21";

/// A recorded language-model run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRun {
    /// Run name.
    pub name: &'static str,
    /// Predictions table, relative to the data directory.
    pub predictions: &'static str,
    /// Ontology the responses answer.
    pub ontology: OntologyVersion,
}

const fn run(name: &'static str, predictions: &'static str, ontology: OntologyVersion) -> ModelRun {
    ModelRun {
        name,
        predictions,
        ontology,
    }
}

/// Known model runs.
pub const MODEL_RUNS: &[ModelRun] = &[
    run("llama-3-8b-v20", "collection-llama-3-8b-instruct_medical.csv", OntologyVersion::V20),
    run("llama-3-70b-v20", "collection-llama-3-70b-instruct_medical.csv", OntologyVersion::V20),
    // temperature 0.1
    run("chat-gpt-4-v21", "collection-gpt-4-turbo-2024-04-09_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3-8b-v21", "collection-llama-3-8b-instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3-70b-v21", "collection-llama-3-70b-instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("chat-gpt-3-v21", "collection-gpt-3.5-turbo-0125_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3.2-3b-v21", "collection-llama-3.2-3B-Instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3.2-1b-v21", "collection-llama-3.2-1B-Instruct_medical-v2.1.csv", OntologyVersion::V21),
    // temperature 0.5
    run("llama-3-8b-v21-t05", "results-t05/collection-llama-3-8b-instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3-70b-v21-t05", "results-t05/collection-llama-3-70b-instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("chat-gpt-3-v21-t05", "results-t05/collection-gpt-3.5-turbo-0125_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3.2-3b-v21-t05", "results-t05/collection-llama-3.2-3B-Instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3.2-1b-v21-t05", "results-t05/collection-llama-3.2-1B-Instruct_medical-v2.1.csv", OntologyVersion::V21),
    // temperature 1.0
    run("llama-3-8b-v21-t10", "results-t10/collection-llama-3-8b-instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3-70b-v21-t10", "results-t10/collection-llama-3-70b-instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("chat-gpt-3-v21-t10", "results-t10/collection-gpt-3.5-turbo-0125_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3.2-3b-v21-t10", "results-t10/collection-llama-3.2-3B-Instruct_medical-v2.1.csv", OntologyVersion::V21),
    run("llama-3.2-1b-v21-t10", "results-t10/collection-llama-3.2-1B-Instruct_medical-v2.1.csv", OntologyVersion::V21),
];

/// Looks up a model run by name.
pub fn find_model(name: &str) -> ClassifyResult<&'static ModelRun> {
    MODEL_RUNS
        .iter()
        .find(|run| run.name == name)
        .ok_or_else(|| ClassifyError::UnknownModel { name: name.to_string() })
}

/// Input and output locations of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory holding prediction tables and per-ontology outputs.
    pub data_dir: PathBuf,
    /// Gold collection table.
    pub collection: PathBuf,
    /// Pre-extracted metadata table; `None` reads metadata from the rows.
    pub metadata: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            collection: PathBuf::from(DEFAULT_COLLECTION),
            metadata: None,
        }
    }
}

impl RunConfig {
    /// Resolves the data directory from the flag, then [`DATA_DIR_ENV`],
    /// then the default.
    pub fn resolve(data_dir: Option<PathBuf>, collection: Option<PathBuf>, metadata: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self {
            data_dir,
            collection: collection.unwrap_or_else(|| PathBuf::from(DEFAULT_COLLECTION)),
            metadata,
        }
    }

    /// Predictions table of a run.
    pub fn predictions_path(&self, run: &ModelRun) -> PathBuf {
        self.data_dir.join(run.predictions)
    }

    /// Output directory of an ontology.
    pub fn output_dir(&self, ontology_name: &str) -> PathBuf {
        self.data_dir.join(ontology_name)
    }

    /// Series table classified from model responses.
    pub fn llm_series_path(&self, ontology_name: &str, model: &str) -> PathBuf {
        self.output_dir(ontology_name).join(format!("{}.csv", model))
    }

    /// Series table classified by the manual rules.
    pub fn manual_series_path(&self, ontology_name: &str) -> PathBuf {
        self.output_dir(ontology_name).join("series-results-manual.csv")
    }

    /// Series table classified from metadata only.
    pub fn metadata_series_path(&self, ontology_name: &str) -> PathBuf {
        self.output_dir(ontology_name).join("series-results-metadata.csv")
    }

    /// Patient table of a run.
    pub fn patient_path(&self, ontology_name: &str, model: &str) -> PathBuf {
        self.output_dir(ontology_name)
            .join(format!("patient-ontology-{}.csv", model))
    }

    /// Confusion heatmap of a concept.
    pub fn heatmap_path(&self, ontology_name: &str, model: &str, concept: &str) -> PathBuf {
        self.output_dir(ontology_name)
            .join(format!("{}-{}.svg", model, concept))
    }

    /// Error listing of a concept.
    pub fn analysis_path(&self, ontology_name: &str, model: &str, concept: &str) -> PathBuf {
        self.output_dir(ontology_name)
            .join(format!("analysis-{}-{}.txt", model, concept))
    }

    /// Returns the metadata table path, if configured and present.
    pub fn existing_metadata(&self) -> Option<&Path> {
        self.metadata.as_deref().filter(|p| p.exists())
    }
}
