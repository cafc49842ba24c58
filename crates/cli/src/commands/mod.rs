//! CLI subcommands and shared input handling

pub mod describe;
pub mod model;
pub mod predict;

use anyhow::{bail, Context, Result};
use clap::Args;
use solubility_lib::{predictor::ModelSource, RowFailure};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use tabled::Tabled;
use tracing::debug;

use crate::output::print_table;

/// Where SMILES come from: positional arguments, a file, or stdin
#[derive(Args, Debug)]
pub struct InputArgs {
    /// SMILES strings to process
    pub smiles: Vec<String>,

    /// Read SMILES from a file, one per line ("-" reads stdin). Blank lines
    /// are skipped; tables still report the original line number
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

/// Where an input SMILES came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// 1-based position among the positional arguments
    Argument(usize),
    /// 1-based line number in the input file
    Line(usize),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Argument(n) => write!(f, "arg {}", n),
            Origin::Line(n) => write!(f, "line {}", n),
        }
    }
}

/// SMILES in batch order, each with its origin
#[derive(Debug, Default)]
pub struct InputBatch {
    pub smiles: Vec<String>,
    pub origins: Vec<Origin>,
}

impl InputBatch {
    /// Origin label for a batch index, as shown in tables
    pub fn origin(&self, index: usize) -> String {
        self.origins
            .get(index)
            .map(Origin::to_string)
            .unwrap_or_else(|| index.to_string())
    }
}

impl InputArgs {
    /// Positional SMILES first, then input lines, in order
    pub fn collect(&self) -> Result<InputBatch> {
        if self.smiles.is_empty() && self.input.is_none() {
            bail!("No SMILES given; pass them as arguments or with --input");
        }

        let mut batch = InputBatch::default();
        for (i, smiles) in self.smiles.iter().enumerate() {
            batch.smiles.push(smiles.clone());
            batch.origins.push(Origin::Argument(i + 1));
        }
        if let Some(path) = &self.input {
            let content = if path.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read SMILES from stdin")?;
                buf
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?
            };
            for (line, smiles) in parse_lines(&content) {
                batch.smiles.push(smiles);
                batch.origins.push(Origin::Line(line));
            }
        }

        debug!(count = batch.smiles.len(), "Collected input SMILES");
        Ok(batch)
    }
}

/// Trimmed non-blank lines with their 1-based line numbers
pub fn parse_lines(content: &str) -> Vec<(usize, String)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| (n, line.to_string()))
        .collect()
}

pub fn model_source(model_path: Option<PathBuf>) -> ModelSource {
    match model_path {
        Some(path) => ModelSource::Path(path),
        None => ModelSource::bundled(),
    }
}

/// Row for the failed-input table
#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Input")]
    origin: String,
    #[tabled(rename = "SMILES")]
    smiles: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Error")]
    error: String,
}

pub fn print_failures(failures: &[RowFailure], batch: &InputBatch) {
    let rows: Vec<FailureRow> = failures
        .iter()
        .map(|f| FailureRow {
            origin: batch.origin(f.index),
            smiles: f.smiles.clone(),
            kind: f.error.kind().to_string(),
            error: match &f.error {
                solubility_lib::RowError::Parse(e) => e.to_string(),
                solubility_lib::RowError::Descriptor(e) => e.to_string(),
            },
        })
        .collect();
    print_table(&rows, "No failed rows");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines_trims_and_skips_blanks() {
        let lines = parse_lines("CCO\n\n  c1ccccc1  \r\n\t\nCC(=O)O\n");
        assert_eq!(
            lines,
            vec![
                (1, "CCO".to_string()),
                (3, "c1ccccc1".to_string()),
                (5, "CC(=O)O".to_string()),
            ]
        );
    }

    #[test]
    fn test_collect_requires_some_input() {
        let args = InputArgs {
            smiles: Vec::new(),
            input: None,
        };
        assert!(args.collect().is_err());
    }

    #[test]
    fn test_collect_appends_file_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("input.smi");
        std::fs::write(&path, "CCO\n\nCCCC\n").unwrap();

        let args = InputArgs {
            smiles: vec!["C".to_string()],
            input: Some(path),
        };
        let batch = args.collect().unwrap();
        assert_eq!(batch.smiles, vec!["C", "CCO", "CCCC"]);
        assert_eq!(
            batch.origins,
            vec![Origin::Argument(1), Origin::Line(1), Origin::Line(3)]
        );
        assert_eq!(batch.origin(2), "line 3");
    }
}
