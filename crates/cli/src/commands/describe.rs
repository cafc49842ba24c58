//! Descriptor command

use anyhow::{Context, Result};
use solubility_lib::{DescribedRow, SolubilityPipeline};
use tabled::Tabled;

use super::{print_failures, InputArgs, InputBatch};
use crate::output::{print_json, print_table, print_warning, OutputFormat};

/// Row for the descriptor table
#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "Input")]
    origin: String,
    #[tabled(rename = "SMILES")]
    smiles: String,
    #[tabled(rename = "MolLogP")]
    log_p: String,
    #[tabled(rename = "MolWt")]
    weight: String,
    #[tabled(rename = "NumRotatableBonds")]
    rotatable: String,
    #[tabled(rename = "AromaticProportion")]
    aromatic: String,
}

impl DescriptorRow {
    fn new(row: &DescribedRow, batch: &InputBatch) -> Self {
        let d = &row.descriptors;
        Self {
            origin: batch.origin(row.index),
            smiles: row.smiles.clone(),
            log_p: format!("{:.4}", d.log_p),
            weight: format!("{:.3}", d.molecular_weight),
            rotatable: format!("{}", d.rotatable_bonds),
            aromatic: format!("{:.3}", d.aromatic_proportion),
        }
    }
}

/// Calculate descriptors for every input SMILES; no model is needed
pub fn run(input: &InputArgs, format: OutputFormat) -> Result<()> {
    let batch = input.collect()?;
    let pipeline = SolubilityPipeline::new();
    let report = pipeline
        .describe(&batch.smiles)
        .context("Descriptor calculation failed")?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let rows: Vec<DescriptorRow> = report
                .rows
                .iter()
                .map(|row| DescriptorRow::new(row, &batch))
                .collect();
            print_table(&rows, "No molecules described");
            if !report.failures.is_empty() {
                println!();
                print_warning(&format!(
                    "{} of {} rows could not be described",
                    report.failures.len(),
                    report.total
                ));
                print_failures(&report.failures, &batch);
            }
        }
    }

    Ok(())
}
