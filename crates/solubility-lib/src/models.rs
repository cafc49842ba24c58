//! Core data models for the solubility pipeline

use crate::error::RowFailure;
use serde::{Deserialize, Serialize};

/// Number of descriptor columns consumed by the model
pub const NUM_FEATURES: usize = 4;

/// Descriptor column order. Model coefficients are fitted against this exact
/// order, so it must only change together with the model artifact.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "MolLogP",
    "MolWt",
    "NumRotatableBonds",
    "AromaticProportion",
];

/// Descriptor vector for one molecule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptorVector {
    #[serde(rename = "MolLogP")]
    pub log_p: f64,
    #[serde(rename = "MolWt")]
    pub molecular_weight: f64,
    #[serde(rename = "NumRotatableBonds")]
    pub rotatable_bonds: f64,
    #[serde(rename = "AromaticProportion")]
    pub aromatic_proportion: f64,
}

impl DescriptorVector {
    /// Values in `FEATURE_COLUMNS` order
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [
            self.log_p,
            self.molecular_weight,
            self.rotatable_bonds,
            self.aromatic_proportion,
        ]
    }

    pub fn from_row(row: &[f64]) -> Option<Self> {
        match *row {
            [log_p, molecular_weight, rotatable_bonds, aromatic_proportion] => Some(Self {
                log_p,
                molecular_weight,
                rotatable_bonds,
                aromatic_proportion,
            }),
            _ => None,
        }
    }
}

/// Dense row-major feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    rows: usize,
    columns: usize,
}

impl FeatureMatrix {
    /// Empty matrix with the pipeline's column count
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            rows: 0,
            columns: NUM_FEATURES,
        }
    }

    /// Build a matrix from descriptor vectors, one row each, in order
    pub fn from_descriptors(descriptors: &[DescriptorVector]) -> Self {
        let mut data = Vec::with_capacity(descriptors.len() * NUM_FEATURES);
        for d in descriptors {
            data.extend_from_slice(&d.to_row());
        }
        Self {
            data,
            rows: descriptors.len(),
            columns: NUM_FEATURES,
        }
    }

    /// Wrap flat row-major data. Returns `None` when `columns` is zero or the
    /// data length is not a multiple of it.
    pub fn from_flat(data: Vec<f64>, columns: usize) -> Option<Self> {
        if columns == 0 || data.len() % columns != 0 {
            return None;
        }
        let rows = data.len() / columns;
        Some(Self {
            data,
            rows,
            columns,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        if idx >= self.rows {
            return None;
        }
        Some(&self.data[idx * self.columns..(idx + 1) * self.columns])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| &self.data[i * self.columns..(i + 1) * self.columns])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl Default for FeatureMatrix {
    fn default() -> Self {
        Self::empty()
    }
}

/// Coarse solubility band derived from LogS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolubilityClass {
    HighlySoluble,
    Soluble,
    SlightlySoluble,
    Insoluble,
}

impl SolubilityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolubilityClass::HighlySoluble => "highly soluble",
            SolubilityClass::Soluble => "soluble",
            SolubilityClass::SlightlySoluble => "slightly soluble",
            SolubilityClass::Insoluble => "insoluble",
        }
    }
}

impl std::fmt::Display for SolubilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction for one input row, re-attached to its original SMILES
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub index: usize,
    pub smiles: String,
    pub descriptors: DescriptorVector,
    /// Predicted log10 of aqueous solubility in mol/L
    pub log_s: f64,
    pub solubility_mol_per_l: f64,
    pub class: SolubilityClass,
}

/// Result of running the pipeline over one batch
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub model_version: String,
    pub generated_at: i64,
    /// Number of input rows, including failed ones
    pub total: usize,
    pub predictions: Vec<PredictionRecord>,
    pub failures: Vec<RowFailure>,
}

impl PredictionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
