//! Model information command

use anyhow::{Context, Result};
use colored::Colorize;
use solubility_lib::predictor::{LoadOptions, ModelHandle};
use std::path::PathBuf;

use super::model_source;
use crate::output::{print_json, print_success, OutputFormat};

/// Load the model and show its metadata
pub fn show(model_path: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let source = model_source(model_path);
    let origin = source.describe();
    let handle = ModelHandle::load_with(source, &LoadOptions::default())
        .with_context(|| format!("Failed to load model from {}", origin))?;
    let info = handle.info();

    match format {
        OutputFormat::Json => print_json(info)?,
        OutputFormat::Table => {
            print_success(&format!("Model {} loaded", info.name.cyan()));
            println!();
            println!("{}", "Model".bold());
            println!("{}", "=".repeat(50));
            println!("Name:                   {}", info.name);
            println!("Version:                {}", info.version);
            println!("Kind:                   {}", info.kind);
            println!("Source:                 {}", info.source);
            println!("Checksum:               {}", info.checksum);
            println!("Features:               {}", info.feature_columns.join(", "));

            if let Some(meta) = &info.metadata {
                println!();
                println!("{}", "Training".bold());
                println!("{}", "-".repeat(50));
                println!("Dataset:                {}", meta.dataset);
                if let Some(samples) = meta.samples {
                    println!("Samples:                {}", samples);
                }
                if let Some(r_squared) = meta.r_squared {
                    println!("R²:                     {:.3}", r_squared);
                }
                if let Some(trained_at) = &meta.trained_at {
                    println!("Trained at:             {}", trained_at);
                }
            }
        }
    }

    Ok(())
}
