//! Series classification and evaluation binary.

use clap::Parser;
use series_classifier::EvalOptions;
use series_eval::commands;
use series_eval::{Cli, Commands, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    if let Commands::Ontology { version } = &cli.command {
        println!("{}", commands::ontology_json(version)?);
        return Ok(());
    }

    let ctx = Context::from_cli(&cli)?;
    tracing::info!("Model {} on {}", ctx.run.name, ctx.ontology.name());

    match cli.command {
        Commands::Classify { mode } => commands::classify(&ctx, mode.into())?,
        Commands::Patients => commands::patients(&ctx)?,
        Commands::Evaluate { no_heatmaps } => {
            let options = EvalOptions {
                heatmaps: !no_heatmaps,
                ..EvalOptions::model_comparison()
            };
            commands::evaluate(&ctx, &options)?;
        }
        Commands::Baseline { seed } => {
            commands::baseline(&ctx, seed)?;
        }
        Commands::Errors => {
            let files = commands::errors(&ctx)?;
            tracing::info!("Wrote {} error listings", files);
        }
        Commands::Ontology { .. } => {}
    }

    Ok(())
}
