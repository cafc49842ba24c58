//! Aqueous solubility (LogS) prediction library
//!
//! This crate provides the core functionality for:
//! - SMILES parsing and molecular descriptor calculation
//! - Feature matrix assembly over batches of molecules
//! - Loading pre-trained regression models and predicting LogS
//! - Health checks and observability

pub mod chem;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod predictor;

pub use error::{
    BatchRejected, DescriptorError, FeatureError, ModelLoadError, ParseError, ParseErrorKind,
    PredictError, RowError, RowFailure,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use pipeline::{DescribedRow, DescriptorReport, SolubilityPipeline};
