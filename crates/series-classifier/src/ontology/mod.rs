//! Ontology schemas.
//!
//! An [`Ontology`] is the complete, immutable description of what to extract
//! from a series: its concepts (each with up to three rule sets and a label
//! set), the patient-level categories and the output column order. Two
//! versions are built in; others can be loaded from JSON.

mod v20;
mod v21;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use series_types::{CategoryRule, Concept, Handler, Matcher, OntologyVersion, ParserType};

use crate::types::{ClassifyError, ClassifyResult};

/// Concept columns of a series table, in file order. Versions that lack a
/// concept leave its column empty.
pub const SERIES_CONCEPT_COLUMNS: &[&str] = &[
    v20::WEIGHT_IS_DWI,
    v20::WEIGHT_IS_ADC,
    v20::WEIGHT_T,
    v20::IS_FS,
    v20::CONTRAST_TIME,
    v20::IS_CONTRAST_AGENT,
    v20::AQUISITION_ECHO,
    v20::PLANE_TYPE,
    v20::PHASE_TYPE,
];

/// A versioned classification schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ontology {
    name: String,
    concepts: Vec<Concept>,
    categories: Vec<CategoryRule>,
    header: Vec<String>,
}

impl Ontology {
    /// Creates and validates an ontology.
    ///
    /// # Errors
    /// Returns [`ClassifyError::Schema`] if any structural invariant fails.
    pub fn new(
        name: impl Into<String>,
        concepts: Vec<Concept>,
        categories: Vec<CategoryRule>,
        header: Vec<String>,
    ) -> ClassifyResult<Self> {
        let ontology = Self {
            name: name.into(),
            concepts,
            categories,
            header,
        };
        ontology.validate()?;
        Ok(ontology)
    }

    /// Returns a built-in ontology.
    pub fn builtin(version: OntologyVersion) -> ClassifyResult<Self> {
        match version {
            OntologyVersion::V20 => v20::ontology(),
            OntologyVersion::V21 => v21::ontology(),
        }
    }

    /// Resolves a built-in ontology by name (`"v21"` or `"ontology-v21"`).
    pub fn by_name(name: &str) -> ClassifyResult<Self> {
        let version = OntologyVersion::from_name(name).ok_or_else(|| ClassifyError::UnknownOntology {
            name: name.to_string(),
        })?;
        Self::builtin(version)
    }

    /// Ontology name, used to tag output files.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concepts in evaluation order.
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Looks up a concept by key.
    pub fn concept(&self, key: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.key == key)
    }

    /// Concept keys in evaluation order.
    pub fn concept_keys(&self) -> impl Iterator<Item = &str> {
        self.concepts.iter().map(|c| c.key.as_str())
    }

    /// `(key, matcher)` pairs of every concept that has a rule set for
    /// `parser`, in evaluation order.
    pub fn parsers_for(&self, parser: ParserType) -> impl Iterator<Item = (&str, &Matcher)> {
        self.concepts
            .iter()
            .filter_map(move |c| c.matcher(parser).map(|m| (c.key.as_str(), m)))
    }

    /// Declared labels of a concept. `None` if the concept is unknown or has
    /// no label set.
    pub fn labels_for(&self, key: &str, keep_unknown: bool) -> Option<Vec<String>> {
        self.concept(key)
            .and_then(|c| c.labels.as_ref())
            .map(|labels| labels.labels(keep_unknown))
    }

    /// Patient-level categories, in column order.
    pub fn series_to_patient_mapping(&self) -> &[CategoryRule] {
        &self.categories
    }

    /// Category names, in column order.
    pub fn mapping_header(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Concept columns of a series output row.
    pub fn full_header(&self) -> &[String] {
        &self.header
    }

    /// Checks the structural invariants.
    ///
    /// - concept keys and category names are unique
    /// - every header entry is a concept key
    /// - rule chains are non-empty
    /// - pattern trees have a start state, non-empty choices and patterned
    ///   if-else branches
    pub fn validate(&self) -> ClassifyResult<()> {
        let mut keys = HashSet::new();
        for concept in &self.concepts {
            if !keys.insert(concept.key.as_str()) {
                return Err(schema(format!("duplicate concept key '{}'", concept.key)));
            }
            for parser in ParserType::ALL {
                if let Some(matcher) = concept.matcher(parser) {
                    validate_matcher(&concept.key, parser, matcher)?;
                }
            }
        }

        for column in &self.header {
            if !keys.contains(column.as_str()) {
                return Err(schema(format!("header column '{}' is not a concept", column)));
            }
        }

        let mut names = HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(schema(format!("duplicate category '{}'", category.name)));
            }
        }

        Ok(())
    }

    /// Serializes the ontology as pretty-printed JSON.
    pub fn to_json(&self) -> ClassifyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads and validates an ontology from JSON text.
    ///
    /// Unknown handler kinds and malformed label sets are reported as schema
    /// errors.
    pub fn from_json_str(json: &str) -> ClassifyResult<Self> {
        let ontology: Self =
            serde_json::from_str(json).map_err(|e| schema(format!("invalid ontology document: {}", e)))?;
        ontology.validate()?;
        Ok(ontology)
    }

    /// Loads and validates an ontology from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ClassifyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifyError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

fn schema(message: String) -> ClassifyError {
    ClassifyError::Schema(message)
}

fn validate_matcher(key: &str, parser: ParserType, matcher: &Matcher) -> ClassifyResult<()> {
    match matcher {
        Matcher::RuleChain(chain) => {
            if chain.is_empty() {
                return Err(schema(format!("{} rule chain of '{}' is empty", parser, key)));
            }
        }
        Matcher::PatternTree(tree) => {
            if !tree.has_start() {
                return Err(schema(format!("{} pattern tree of '{}' has no start state", parser, key)));
            }
            for (state, handler) in tree.states() {
                match handler {
                    Handler::Choice(branches) if branches.is_empty() => {
                        return Err(schema(format!(
                            "{} pattern tree of '{}': state '{}' has no branches",
                            parser, key, state
                        )));
                    }
                    Handler::IfElse { branch, .. } if branch.is_catch_all() => {
                        return Err(schema(format!(
                            "{} pattern tree of '{}': if-else state '{}' needs patterns",
                            parser, key, state
                        )));
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}
