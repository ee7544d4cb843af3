//! # series-eval
//!
//! Command-line runner around `series-classifier`: classifies collection and
//! model-response tables, aggregates patients, scores model runs against the
//! gold annotation and writes heatmaps and error listings.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, Mode};
pub use commands::Context;
