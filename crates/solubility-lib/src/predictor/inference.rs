//! Model loading and inference
//!
//! Linear models come from the JSON artifact envelope; ONNX graphs are loaded
//! through tract. Either way the result is a `ModelHandle`: an immutable,
//! cheaply cloneable regressor that can be shared across threads.

use super::artifact::{
    compute_checksum, detect_format, ArtifactFormat, LoadOptions, ModelArtifact, ModelSource,
    ModelSpec, TrainingMetadata,
};
use super::Regressor;
use crate::error::{ModelLoadError, PredictError};
use crate::models::{FeatureMatrix, FEATURE_COLUMNS, NUM_FEATURES};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tract_onnx::tract_hir::internal::DimLike;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::infer::GenericFactoid;
use tracing::{debug, info, warn};

/// Batch latency above which a warning is logged
const SLOW_BATCH: Duration = Duration::from_millis(250);

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Linear regression over the descriptor columns
#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, PredictError> {
        if row.len() != self.coefficients.len() {
            return Err(PredictError::DimensionMismatch {
                expected: self.coefficients.len(),
                found: row.len(),
            });
        }
        Ok(self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>())
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

/// ONNX regressor with a `[1, 4]` f32 input and a single output value
pub struct OnnxModel {
    plan: TractModel,
}

impl OnnxModel {
    /// Load and optimize an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let corrupt = |stage: &str, e: TractError| ModelLoadError::Corrupt(format!("{}: {}", stage, e));
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .map_err(|e| corrupt("failed to parse ONNX model", e))?;
        check_input_width(declared_input_width(&model))?;
        let plan = model
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .map_err(|e| corrupt("model does not accept a [1, 4] input", e))?
            .into_optimized()
            .map_err(|e| corrupt("failed to optimize model", e))?
            .into_runnable()
            .map_err(|e| corrupt("failed to create runnable model", e))?;
        Ok(Self { plan })
    }
}

/// Last input dimension, when the graph declares it as a fixed size
fn declared_input_width(model: &InferenceModel) -> Option<usize> {
    let fact = model.input_fact(0).ok()?;
    match fact.shape.dims().last()? {
        GenericFactoid::Only(dim) => dim.to_usize().ok(),
        GenericFactoid::Any => None,
    }
}

fn check_input_width(found: Option<usize>) -> Result<(), ModelLoadError> {
    match found {
        Some(found) if found != NUM_FEATURES => Err(ModelLoadError::IncompatibleFeatures {
            expected: NUM_FEATURES,
            found,
        }),
        _ => Ok(()),
    }
}

impl Regressor for OnnxModel {
    fn n_features(&self) -> usize {
        NUM_FEATURES
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, PredictError> {
        let data: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, row.len()), data)
            .map_err(|e| PredictError::Inference(e.to_string()))?
            .into();
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let output = outputs
            .first()
            .ok_or_else(|| PredictError::Inference("model produced no output".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        view.iter()
            .next()
            .map(|&v| v as f64)
            .ok_or_else(|| PredictError::Inference("model output is empty".to_string()))
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

/// Descriptive information about a loaded model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub kind: String,
    pub feature_columns: Vec<String>,
    /// SHA-256 of the raw artifact bytes
    pub checksum: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TrainingMetadata>,
}

/// Shared, immutable handle to a loaded model
#[derive(Clone)]
pub struct ModelHandle {
    regressor: Arc<dyn Regressor>,
    info: Arc<ModelInfo>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    pub fn load(source: ModelSource) -> Result<Self, ModelLoadError> {
        Self::load_with(source, &LoadOptions::default())
    }

    /// The model shipped with the crate
    pub fn bundled() -> Result<Self, ModelLoadError> {
        Self::load(ModelSource::bundled())
    }

    pub fn load_with(source: ModelSource, options: &LoadOptions) -> Result<Self, ModelLoadError> {
        let origin = source.describe();
        let bytes = source.read(options)?;
        let checksum = compute_checksum(&bytes);

        match detect_format(&bytes) {
            ArtifactFormat::Json => {
                let artifact = ModelArtifact::from_json(&bytes)?;
                Self::from_artifact(artifact, options, origin, checksum)
            }
            ArtifactFormat::Onnx => {
                let model = OnnxModel::from_bytes(&bytes)?;
                let name = std::path::Path::new(&origin)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|_| !origin.starts_with('<'))
                    .unwrap_or("onnx-model")
                    .to_string();
                let info = ModelInfo {
                    name,
                    version: checksum[..12].to_string(),
                    kind: model.kind().to_string(),
                    feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                    checksum,
                    source: origin,
                    metadata: None,
                };
                Ok(Self::from_regressor(Arc::new(model), info))
            }
        }
    }

    fn from_artifact(
        artifact: ModelArtifact,
        options: &LoadOptions,
        source: String,
        checksum: String,
    ) -> Result<Self, ModelLoadError> {
        artifact.validate(options)?;
        let regressor: Arc<dyn Regressor> = match artifact.model {
            ModelSpec::Linear {
                intercept,
                coefficients,
            } => Arc::new(LinearModel::new(intercept, coefficients)),
        };
        let info = ModelInfo {
            name: artifact.name,
            version: artifact.version,
            kind: regressor.kind().to_string(),
            feature_columns: artifact.feature_columns,
            checksum,
            source,
            metadata: artifact.metadata,
        };
        Ok(Self::from_regressor(regressor, info))
    }

    /// Wrap an already constructed regressor
    pub fn from_regressor(regressor: Arc<dyn Regressor>, info: ModelInfo) -> Self {
        Self {
            regressor,
            info: Arc::new(info),
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn version(&self) -> &str {
        &self.info.version
    }

    pub fn n_features(&self) -> usize {
        self.regressor.n_features()
    }

    /// One prediction per matrix row, in row order
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
        let expected = self.regressor.n_features();
        if matrix.columns() != expected {
            return Err(PredictError::DimensionMismatch {
                expected,
                found: matrix.columns(),
            });
        }
        matrix
            .iter_rows()
            .enumerate()
            .map(|(row, values)| {
                let y = self.regressor.predict_row(values)?;
                if y.is_finite() {
                    Ok(y)
                } else {
                    Err(PredictError::NonFinitePrediction { row })
                }
            })
            .collect()
    }
}

enum PredictorState {
    Idle,
    ModelLoaded(ModelHandle),
}

/// Pipeline-level predictor: `Idle` until a model loads successfully
pub struct SolubilityPredictor {
    state: PredictorState,
    inference_count: AtomicU64,
    rows_predicted: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl Default for SolubilityPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl SolubilityPredictor {
    pub fn new() -> Self {
        Self {
            state: PredictorState::Idle,
            inference_count: AtomicU64::new(0),
            rows_predicted: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        }
    }

    /// Load a model, replacing any current one.
    ///
    /// On failure the predictor is left `Idle`, even if a model was loaded
    /// before.
    pub fn load(
        &mut self,
        source: ModelSource,
        options: &LoadOptions,
    ) -> Result<ModelHandle, ModelLoadError> {
        self.state = PredictorState::Idle;
        let handle = ModelHandle::load_with(source, options)?;
        info!(
            name = %handle.info().name,
            version = %handle.info().version,
            kind = %handle.info().kind,
            "Model loaded"
        );
        self.set_model(handle.clone());
        Ok(handle)
    }

    pub fn set_model(&mut self, handle: ModelHandle) {
        self.state = PredictorState::ModelLoaded(handle);
    }

    pub fn unload(&mut self) {
        self.state = PredictorState::Idle;
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, PredictorState::ModelLoaded(_))
    }

    pub fn state_name(&self) -> &'static str {
        match self.state {
            PredictorState::Idle => "idle",
            PredictorState::ModelLoaded(_) => "model_loaded",
        }
    }

    pub fn handle(&self) -> Option<&ModelHandle> {
        match &self.state {
            PredictorState::ModelLoaded(handle) => Some(handle),
            PredictorState::Idle => None,
        }
    }

    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
        let handle = self.handle().ok_or(PredictError::ModelNotLoaded)?;

        let start = Instant::now();
        let predictions = handle.predict(matrix)?;
        let elapsed = start.elapsed();

        self.inference_count.fetch_add(1, Ordering::Relaxed);
        self.rows_predicted
            .fetch_add(predictions.len() as u64, Ordering::Relaxed);

        if elapsed > SLOW_BATCH {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                rows = matrix.rows(),
                "Inference exceeded {}ms target",
                SLOW_BATCH.as_millis()
            );
        } else {
            debug!(
                elapsed_us = elapsed.as_micros() as u64,
                rows = matrix.rows(),
                "Inference completed"
            );
        }
        Ok(predictions)
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            rows_predicted: self.rows_predicted.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

/// Inference statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub rows_predicted: u64,
    pub slow_inferences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DescriptorVector;

    fn matrix(rows: &[[f64; 4]]) -> FeatureMatrix {
        let descriptors: Vec<DescriptorVector> = rows
            .iter()
            .filter_map(|r| DescriptorVector::from_row(r))
            .collect();
        FeatureMatrix::from_descriptors(&descriptors)
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel::new(1.0, vec![1.0, 0.5, 0.0, -1.0]);
        assert_eq!(model.predict_row(&[2.0, 4.0, 9.0, 1.0]).unwrap(), 4.0);
        assert!(matches!(
            model.predict_row(&[1.0]),
            Err(PredictError::DimensionMismatch { expected: 4, found: 1 })
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let handle = ModelHandle::bundled().unwrap();
        assert_eq!(handle.info().kind, "linear");
        assert_eq!(handle.info().feature_columns, FEATURE_COLUMNS);
        assert_eq!(handle.n_features(), NUM_FEATURES);
        assert!(handle.info().metadata.is_some());
    }

    #[test]
    fn test_bundled_model_values() {
        let handle = ModelHandle::bundled().unwrap();
        let out = handle.predict(&matrix(&[[0.0; 4], [1.0, 100.0, 2.0, 0.5]])).unwrap();
        assert!((out[0] - 0.2565).abs() < 1e-12);
        let expected = 0.2565 - 0.7414 - 0.66 + 0.0064 - 0.2118;
        assert!((out[1] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_matrix_gives_empty_predictions() {
        let handle = ModelHandle::bundled().unwrap();
        assert!(handle.predict(&FeatureMatrix::empty()).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_keeps_handle_usable() {
        let handle = ModelHandle::bundled().unwrap();
        let wide = FeatureMatrix::from_flat(vec![0.0; 10], 5).unwrap();
        assert!(matches!(
            handle.predict(&wide),
            Err(PredictError::DimensionMismatch { expected: 4, found: 5 })
        ));
        assert_eq!(handle.predict(&matrix(&[[0.0; 4]])).unwrap().len(), 1);
    }

    #[test]
    fn test_non_finite_prediction() {
        let handle = ModelHandle::from_regressor(
            Arc::new(LinearModel::new(0.0, vec![1.0, 0.0, 0.0, 0.0])),
            ModelInfo {
                name: "t".into(),
                version: "0".into(),
                kind: "linear".into(),
                feature_columns: vec![],
                checksum: String::new(),
                source: "test".into(),
                metadata: None,
            },
        );
        let m = matrix(&[[1.0, 0.0, 0.0, 0.0], [f64::INFINITY, 0.0, 0.0, 0.0]]);
        assert!(matches!(
            handle.predict(&m),
            Err(PredictError::NonFinitePrediction { row: 1 })
        ));
    }

    #[test]
    fn test_corrupt_blobs_rejected() {
        assert!(matches!(
            ModelHandle::load(ModelSource::Bytes(b"{\"format_version\": 1,".to_vec())),
            Err(ModelLoadError::Corrupt(_))
        ));
        assert!(matches!(
            ModelHandle::load(ModelSource::Bytes(vec![0x08, 0x01, 0xff, 0x00])),
            Err(ModelLoadError::Corrupt(_))
        ));
    }

    fn varint(mut value: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(byte);
                return;
            }
            out.push(byte | 0x80);
        }
    }

    fn int_field(field: u64, value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        varint(field << 3, &mut out);
        varint(value, &mut out);
        out
    }

    fn bytes_field(field: u64, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        varint(field << 3 | 2, &mut out);
        varint(payload.len() as u64, &mut out);
        out.extend_from_slice(payload);
        out
    }

    /// Protobuf bytes of an ONNX graph `y = Identity(x)`, x a float `[1, width]`
    fn identity_onnx(width: u64) -> Vec<u8> {
        let value_info = |name: &str| {
            let dims = [
                bytes_field(1, &int_field(1, 1)),
                bytes_field(1, &int_field(1, width)),
            ]
            .concat();
            let tensor = [int_field(1, 1), bytes_field(2, &dims)].concat();
            [
                bytes_field(1, name.as_bytes()),
                bytes_field(2, &bytes_field(1, &tensor)),
            ]
            .concat()
        };
        let node = [
            bytes_field(1, b"x"),
            bytes_field(2, b"y"),
            bytes_field(4, b"Identity"),
        ]
        .concat();
        let graph = [
            bytes_field(1, &node),
            bytes_field(2, b"identity"),
            bytes_field(11, &value_info("x")),
            bytes_field(12, &value_info("y")),
        ]
        .concat();
        [
            int_field(1, 7),
            bytes_field(7, &graph),
            bytes_field(8, &int_field(2, 13)),
        ]
        .concat()
    }

    #[test]
    fn test_onnx_input_width_must_match() {
        assert!(matches!(
            ModelHandle::load(ModelSource::Bytes(identity_onnx(3))),
            Err(ModelLoadError::IncompatibleFeatures {
                expected: 4,
                found: 3
            })
        ));

        let model = OnnxModel::from_bytes(&identity_onnx(4)).unwrap();
        assert_eq!(model.predict_row(&[1.5, 0.0, 0.0, 0.0]).unwrap(), 1.5);
    }

    #[test]
    fn test_input_width_check() {
        assert!(check_input_width(Some(NUM_FEATURES)).is_ok());
        assert!(check_input_width(None).is_ok());
        assert!(matches!(
            check_input_width(Some(7)),
            Err(ModelLoadError::IncompatibleFeatures {
                expected: 4,
                found: 7
            })
        ));
    }

    #[test]
    fn test_predictor_state_machine() {
        let mut predictor = SolubilityPredictor::new();
        assert_eq!(predictor.state_name(), "idle");
        assert!(matches!(
            predictor.predict(&FeatureMatrix::empty()),
            Err(PredictError::ModelNotLoaded)
        ));

        predictor
            .load(ModelSource::bundled(), &LoadOptions::default())
            .unwrap();
        assert!(predictor.is_loaded());
        assert_eq!(predictor.predict(&matrix(&[[0.0; 4]])).unwrap().len(), 1);
        assert_eq!(predictor.stats().total_inferences, 1);
        assert_eq!(predictor.stats().rows_predicted, 1);

        let truncated = BUNDLED_PREFIX.to_vec();
        assert!(predictor
            .load(ModelSource::Bytes(truncated), &LoadOptions::default())
            .is_err());
        assert!(!predictor.is_loaded());
        assert!(matches!(
            predictor.predict(&matrix(&[[0.0; 4]])),
            Err(PredictError::ModelNotLoaded)
        ));
    }

    const BUNDLED_PREFIX: &[u8] = b"{\n  \"format_version\": 1,\n  \"name\": \"esol";
}
