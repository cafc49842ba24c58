//! Prediction command

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::json;
use solubility_lib::{
    predictor::LoadOptions, PredictError, PredictionRecord, PredictionReport, SolubilityPipeline,
};
use std::path::PathBuf;
use tabled::Tabled;

use super::{model_source, print_failures, InputArgs, InputBatch};
use crate::output::{
    color_class, format_log_s, format_molar, print_error, print_info, print_json, print_table,
    print_warning, OutputFormat,
};

/// Row for the predictions table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Input")]
    origin: String,
    #[tabled(rename = "SMILES")]
    smiles: String,
    #[tabled(rename = "LogS")]
    log_s: String,
    #[tabled(rename = "mol/L")]
    molar: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "MolLogP")]
    log_p: String,
    #[tabled(rename = "MolWt")]
    weight: String,
    #[tabled(rename = "RotB")]
    rotatable: String,
    #[tabled(rename = "AromProp")]
    aromatic: String,
}

impl PredictionRow {
    fn new(record: &PredictionRecord, batch: &InputBatch) -> Self {
        let d = &record.descriptors;
        Self {
            origin: batch.origin(record.index),
            smiles: record.smiles.clone(),
            log_s: format_log_s(record.log_s),
            molar: format_molar(record.solubility_mol_per_l),
            class: color_class(record.class),
            log_p: format!("{:.4}", d.log_p),
            weight: format!("{:.3}", d.molecular_weight),
            rotatable: format!("{}", d.rotatable_bonds),
            aromatic: format!("{:.3}", d.aromatic_proportion),
        }
    }
}

/// Predict LogS for every input SMILES
pub fn run(
    input: &InputArgs,
    model_path: Option<PathBuf>,
    strict: bool,
    format: OutputFormat,
) -> Result<()> {
    let batch = input.collect()?;
    let smiles = &batch.smiles;

    let source = model_source(model_path);
    let origin = source.describe();
    let mut pipeline = SolubilityPipeline::new();
    pipeline
        .load_model(source, &LoadOptions::default())
        .with_context(|| format!("Failed to load model from {}", origin))?;

    let result = if strict {
        pipeline.run_strict(smiles)
    } else {
        pipeline.run(smiles)
    };

    let report = match result {
        Ok(report) => report,
        Err(PredictError::Rejected(rejected)) => {
            match format {
                OutputFormat::Json => print_json(&json!({
                    "total": rejected.total,
                    "failures": rejected.failures,
                }))?,
                OutputFormat::Table => {
                    print_error("Strict mode: batch rejected");
                    print_failures(&rejected.failures, &batch);
                }
            }
            bail!(
                "{} of {} rows failed in strict mode",
                rejected.failures.len(),
                rejected.total
            );
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Prediction failed")),
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report, &batch),
    }

    Ok(())
}

fn print_report(report: &PredictionReport, batch: &InputBatch) {
    let rows: Vec<PredictionRow> = report
        .predictions
        .iter()
        .map(|record| PredictionRow::new(record, batch))
        .collect();
    print_table(&rows, "No predictions");

    if !report.failures.is_empty() {
        println!();
        print_warning(&format!(
            "{} of {} rows could not be predicted",
            report.failures.len(),
            report.total
        ));
        print_failures(&report.failures, batch);
    }

    println!();
    print_info(&format!(
        "{} predictions, model version {}",
        report.predictions.len(),
        report.model_version.cyan()
    ));
}
