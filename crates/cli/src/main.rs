//! LogS Solubility CLI
//!
//! A command-line tool for predicting aqueous solubility from SMILES,
//! inspecting calculated descriptors, and showing the loaded model.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{describe, model, predict, InputArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LogS Solubility Predictor CLI
#[derive(Parser)]
#[command(name = "logs")]
#[command(author, version, about = "Aqueous solubility (LogS) prediction from SMILES", long_about = None)]
pub struct Cli {
    /// Output format (falls back to the config file, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict LogS for each SMILES
    Predict {
        #[command(flatten)]
        input: InputArgs,

        /// Model artifact path (uses the bundled model if not specified)
        #[arg(long, env = "LOGS_MODEL_PATH")]
        model: Option<PathBuf>,

        /// Fail the whole batch if any SMILES cannot be described
        #[arg(long)]
        strict: bool,
    },

    /// Show calculated descriptors without predicting
    Describe {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show information about the model
    Model {
        /// Model artifact path (uses the bundled model if not specified)
        #[arg(long, env = "LOGS_MODEL_PATH")]
        model: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let config = config::Config::load()?;
    let format = cli.format.unwrap_or_else(|| config.format());

    match cli.command {
        Commands::Predict {
            input,
            model: model_path,
            strict,
        } => {
            let model_path = model_path.or_else(|| config.model_path.clone());
            predict::run(&input, model_path, strict, format)?;
        }
        Commands::Describe { input } => {
            describe::run(&input, format)?;
        }
        Commands::Model { model: model_path } => {
            let model_path = model_path.or_else(|| config.model_path.clone());
            model::show(model_path, format)?;
        }
    }

    Ok(())
}
