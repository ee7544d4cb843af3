//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use series_classifier::registry::DEFAULT_MODEL;
use series_types::ParserType;

/// Series classification and evaluation runner
#[derive(Parser, Debug)]
#[command(name = "series-eval")]
#[command(about = "Classify MRI/CT series and evaluate model annotations", long_about = None)]
pub struct Cli {
    /// Model run to work with
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Data directory (overrides $SERIES_DATA_DIR and ./data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Gold collection table
    #[arg(long, global = true)]
    pub collection: Option<PathBuf>,

    /// Pre-extracted metadata table keyed by `File Location`
    #[arg(long, global = true)]
    pub metadata: Option<PathBuf>,

    /// JSON ontology used instead of the model's built-in one
    #[arg(long, global = true)]
    pub ontology_file: Option<PathBuf>,

    /// Concepts whose rule diagnostics are logged at info level
    #[arg(long = "trace", global = true, value_name = "CONCEPT")]
    pub traced: Vec<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify series and write the series table
    Classify {
        /// Rule set to apply
        #[arg(long, value_enum, default_value_t = Mode::Llm)]
        mode: Mode,
    },

    /// Aggregate classified series into the patient table
    Patients,

    /// Score the model against the gold annotation
    Evaluate {
        /// Skip writing confusion heatmaps
        #[arg(long)]
        no_heatmaps: bool,
    },

    /// Score random predictions against the gold annotation
    Baseline {
        /// Random seed
        #[arg(long, default_value_t = series_classifier::baseline::DEFAULT_SEED)]
        seed: u64,
    },

    /// Write per-concept listings of misclassified series
    Errors,

    /// Print a built-in ontology as JSON
    Ontology {
        /// Ontology version (v20 or v21)
        #[arg(long = "version", default_value = "v21")]
        version: String,
    },
}

/// Rule set selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Language-model responses
    Llm,
    /// Manual rules over metadata and descriptions
    Manual,
    /// Raw DICOM tags only
    Metadata,
}

impl From<Mode> for ParserType {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Llm => ParserType::Llm,
            Mode::Manual => ParserType::Manual,
            Mode::Metadata => ParserType::Metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["series-eval", "evaluate"]).unwrap();
        assert_eq!(cli.model, DEFAULT_MODEL);
        assert_eq!(cli.log_level, "info");
        assert!(matches!(cli.command, Commands::Evaluate { no_heatmaps: false }));
    }

    #[test]
    fn test_classify_mode() {
        let cli = Cli::try_parse_from(["series-eval", "classify", "--mode", "manual", "--trace", "is_fs"]).unwrap();
        assert!(matches!(cli.command, Commands::Classify { mode: Mode::Manual }));
        assert_eq!(cli.traced, vec!["is_fs"]);
        assert_eq!(ParserType::from(Mode::Manual), ParserType::Manual);
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["series-eval", "baseline", "--seed", "7", "--data-dir", "/tmp/d"]).unwrap();
        assert!(matches!(cli.command, Commands::Baseline { seed: 7 }));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/d")));
    }

    #[test]
    fn test_ontology_version_flag() {
        let cli = Cli::try_parse_from(["series-eval", "ontology", "--version", "v20"]).unwrap();
        assert!(matches!(cli.command, Commands::Ontology { ref version } if version == "v20"));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["series-eval", "classify", "--mode", "guess"]).is_err());
    }
}
