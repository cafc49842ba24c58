//! Prediction output formatting
//!
//! Converts raw LogS values into prediction records with a solubility band
//! and the concentration in mol/L.

use crate::models::{DescriptorVector, PredictionRecord, SolubilityClass};

/// LogS at or above which a compound counts as highly soluble (>= 1 mol/L)
pub const HIGHLY_SOLUBLE_LOGS: f64 = 0.0;

/// LogS at or above which a compound counts as soluble (>= 10 mmol/L)
pub const SOLUBLE_LOGS: f64 = -2.0;

/// LogS at or above which a compound counts as slightly soluble (>= 0.1 mmol/L)
pub const SLIGHTLY_SOLUBLE_LOGS: f64 = -4.0;

/// Band thresholds, each the inclusive lower bound of its band
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub highly_soluble_min: f64,
    pub soluble_min: f64,
    pub slightly_soluble_min: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            highly_soluble_min: HIGHLY_SOLUBLE_LOGS,
            soluble_min: SOLUBLE_LOGS,
            slightly_soluble_min: SLIGHTLY_SOLUBLE_LOGS,
        }
    }
}

/// Formats raw model outputs into prediction records
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(
        &self,
        index: usize,
        smiles: &str,
        descriptors: DescriptorVector,
        log_s: f64,
    ) -> PredictionRecord {
        PredictionRecord {
            index,
            smiles: smiles.to_string(),
            descriptors,
            log_s,
            solubility_mol_per_l: mol_per_litre(log_s),
            class: self.classify(log_s),
        }
    }

    pub fn classify(&self, log_s: f64) -> SolubilityClass {
        if log_s >= self.config.highly_soluble_min {
            SolubilityClass::HighlySoluble
        } else if log_s >= self.config.soluble_min {
            SolubilityClass::Soluble
        } else if log_s >= self.config.slightly_soluble_min {
            SolubilityClass::SlightlySoluble
        } else {
            SolubilityClass::Insoluble
        }
    }
}

/// Concentration in mol/L for a LogS value
pub fn mol_per_litre(log_s: f64) -> f64 {
    10f64.powf(log_s)
}
