//! Solubility prediction engine

mod artifact;
mod descriptors;
mod features;
mod inference;
mod output;


pub use artifact::{
    compute_checksum, detect_format, ArtifactFormat, LoadOptions, ModelArtifact, ModelSource,
    ModelSpec, TrainingMetadata, ARTIFACT_FORMAT_VERSION, BUNDLED_ARTIFACT,
    DEFAULT_MAX_MODEL_BYTES,
};
pub use descriptors::{aromatic_proportion, DescriptorCalculator};
pub use features::{AssemblerConfig, FeatureAssembler, FeatureBatch, DEFAULT_PARALLEL_THRESHOLD};
pub use inference::{
    InferenceStats, LinearModel, ModelHandle, ModelInfo, OnnxModel, SolubilityPredictor,
};
pub use output::{
    mol_per_litre, OutputConfig, OutputFormatter, HIGHLY_SOLUBLE_LOGS, SLIGHTLY_SOLUBLE_LOGS,
    SOLUBLE_LOGS,
};

use crate::error::PredictError;

/// A fitted regression model over descriptor rows
pub trait Regressor: Send + Sync {
    /// Number of input columns the model expects
    fn n_features(&self) -> usize;

    /// Predict LogS for one descriptor row
    fn predict_row(&self, row: &[f64]) -> Result<f64, PredictError>;

    /// Short model family name, e.g. "linear"
    fn kind(&self) -> &'static str;
}
