//! # series-types
//!
//! Type definitions for classifying MRI/CT series into semantic categories.
//!
//! This crate holds the declarative side of the classification engine: labels,
//! concepts, rule chains, pattern trees, patient category rules and the
//! records that flow between classification, aggregation and evaluation. It
//! contains no evaluation logic.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde,
//!   so that ontologies can be dumped and loaded as JSON.
//!
//! ## Usage
//!
//! ```rust
//! use series_types::{Concept, LabelSet, Matcher, Predicate, Rule, RuleChain, UNKNOWN};
//! use series_types::well_known::{self, fields};
//!
//! let plane = Concept::new(
//!     "plane_type",
//!     Some(LabelSet::new([well_known::PLANE_TYPE_AXIAL, UNKNOWN]).unwrap()),
//! )
//! .with_manual(Matcher::RuleChain(RuleChain::new(vec![
//!     Rule::new(Predicate::token(fields::SERIES_DESCRIPTION, "ax"), well_known::PLANE_TYPE_AXIAL),
//!     Rule::catch_all(UNKNOWN),
//! ])));
//!
//! assert_eq!(plane.key, "plane_type");
//! ```

#![warn(missing_docs)]

mod category;
mod concept;
mod enums;
mod label;
pub mod pattern;
mod record;
pub mod rule;
pub mod well_known;

// Re-export all public types at crate root
pub use category::{CategoryRule, Condition};
pub use concept::{Concept, LabelSet, LabelSetError, Matcher};
pub use enums::{MetricKind, OntologyVersion, ParserType};
pub use label::{is_unknown, Label, UNKNOWN};
pub use pattern::{Branch, Handler, PatternTree, START_STATE};
pub use record::{Metadata, PatientRecord, SeriesRecord};
pub use rule::{Case, MatchInput, Predicate, Rule, RuleChain};
