//! Model artifact format and loading
//!
//! A model artifact is either a JSON envelope carrying a linear model or a raw
//! ONNX graph. The JSON envelope records the feature columns it was trained
//! against so a model fitted on a different descriptor schema is rejected at
//! load time instead of silently producing wrong predictions.

use crate::error::ModelLoadError;
use crate::models::{FEATURE_COLUMNS, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Current envelope format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Default size limit for model artifacts (16MB)
pub const DEFAULT_MAX_MODEL_BYTES: usize = 16 * 1024 * 1024;

/// Linear model fitted on the Delaney ESOL dataset, shipped with the crate
pub const BUNDLED_ARTIFACT: &str = include_str!("../../models/solubility-linear.json");

/// JSON model envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub name: String,
    pub version: String,
    pub feature_columns: Vec<String>,
    pub model: ModelSpec,
    /// SHA-256 hex of the canonical model payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TrainingMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
}

impl ModelSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::Linear { .. } => "linear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub dataset: String,
    #[serde(default)]
    pub samples: Option<usize>,
    #[serde(default)]
    pub r_squared: Option<f64>,
    #[serde(default)]
    pub trained_at: Option<String>,
}

/// Where to read a model artifact from
#[derive(Debug, Clone)]
pub enum ModelSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ModelSource {
    /// The artifact embedded in the crate
    pub fn bundled() -> Self {
        ModelSource::Bytes(BUNDLED_ARTIFACT.as_bytes().to_vec())
    }

    /// Human-readable origin, for logs and model info
    pub fn describe(&self) -> String {
        match self {
            ModelSource::Path(path) => path.display().to_string(),
            ModelSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }

    /// Read the raw artifact bytes, enforcing the size limit
    pub fn read(self, options: &LoadOptions) -> Result<Vec<u8>, ModelLoadError> {
        let bytes = match self {
            ModelSource::Path(path) => {
                if !path.exists() {
                    return Err(ModelLoadError::NotFound(path));
                }
                let size = fs::metadata(&path)
                    .map_err(|source| ModelLoadError::Io {
                        path: path.clone(),
                        source,
                    })?
                    .len() as usize;
                if size > options.max_model_bytes {
                    return Err(ModelLoadError::TooLarge {
                        size,
                        max: options.max_model_bytes,
                    });
                }
                fs::read(&path).map_err(|source| ModelLoadError::Io { path, source })?
            }
            ModelSource::Bytes(bytes) => bytes,
        };

        if bytes.is_empty() {
            return Err(ModelLoadError::Empty);
        }
        if bytes.len() > options.max_model_bytes {
            return Err(ModelLoadError::TooLarge {
                size: bytes.len(),
                max: options.max_model_bytes,
            });
        }
        Ok(bytes)
    }
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        ModelSource::Path(path)
    }
}

/// Options applied while loading a model
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub max_model_bytes: usize,
    /// Reject JSON artifacts that carry no checksum
    pub require_checksum: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
            require_checksum: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Onnx,
}

/// JSON if the first non-whitespace byte opens an object, ONNX otherwise
pub fn detect_format(bytes: &[u8]) -> ArtifactFormat {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => ArtifactFormat::Json,
        _ => ArtifactFormat::Onnx,
    }
}

impl ModelArtifact {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ModelLoadError::Corrupt(format!("invalid model envelope: {}", e)))
    }

    /// The bundled artifact, parsed
    pub fn bundled() -> Result<Self, ModelLoadError> {
        Self::from_json(BUNDLED_ARTIFACT.as_bytes())
    }

    /// Build a linear artifact over the standard feature columns
    pub fn linear(
        name: impl Into<String>,
        version: impl Into<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            name: name.into(),
            version: version.into(),
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            model: ModelSpec::Linear {
                intercept,
                coefficients,
            },
            checksum: None,
            metadata: None,
        }
    }

    /// Canonical text the checksum is computed over
    fn canonical_payload(&self) -> String {
        match &self.model {
            ModelSpec::Linear {
                intercept,
                coefficients,
            } => format!(
                "{}|linear|{}|{}",
                self.feature_columns.join(","),
                intercept,
                coefficients
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }

    pub fn compute_checksum(&self) -> String {
        compute_checksum(self.canonical_payload().as_bytes())
    }

    /// Set `checksum` from the current payload
    pub fn seal(mut self) -> Self {
        self.checksum = Some(self.compute_checksum());
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check the envelope against the pipeline's feature schema
    pub fn validate(&self, options: &LoadOptions) -> Result<(), ModelLoadError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedFormatVersion {
                expected: ARTIFACT_FORMAT_VERSION,
                found: self.format_version,
            });
        }
        if self.feature_columns.len() != NUM_FEATURES {
            return Err(ModelLoadError::IncompatibleFeatures {
                expected: NUM_FEATURES,
                found: self.feature_columns.len(),
            });
        }
        if self
            .feature_columns
            .iter()
            .zip(FEATURE_COLUMNS)
            .any(|(found, expected)| found != expected)
        {
            return Err(ModelLoadError::SchemaMismatch {
                expected: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: self.feature_columns.clone(),
            });
        }

        match &self.model {
            ModelSpec::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != NUM_FEATURES {
                    return Err(ModelLoadError::IncompatibleFeatures {
                        expected: NUM_FEATURES,
                        found: coefficients.len(),
                    });
                }
                if !intercept.is_finite() {
                    return Err(ModelLoadError::NonFinite {
                        name: "intercept".to_string(),
                    });
                }
                if let Some(i) = coefficients.iter().position(|c| !c.is_finite()) {
                    return Err(ModelLoadError::NonFinite {
                        name: format!("coefficients[{}]", i),
                    });
                }
            }
        }

        match &self.checksum {
            Some(expected) => {
                let computed = self.compute_checksum();
                if !expected.eq_ignore_ascii_case(&computed) {
                    return Err(ModelLoadError::ChecksumMismatch {
                        expected: expected.clone(),
                        computed,
                    });
                }
            }
            None if options.require_checksum => return Err(ModelLoadError::MissingChecksum),
            None => {}
        }
        Ok(())
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_artifact_is_valid() {
        let artifact = ModelArtifact::bundled().unwrap();
        assert_eq!(artifact.format_version, ARTIFACT_FORMAT_VERSION);
        assert_eq!(artifact.feature_columns, FEATURE_COLUMNS);
        assert!(artifact.checksum.is_some());
        artifact
            .validate(&LoadOptions {
                require_checksum: true,
                ..Default::default()
            })
            .unwrap();
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"  {\"a\":1}"), ArtifactFormat::Json);
        assert_eq!(detect_format(&[0x08, 0x07, 0x12]), ArtifactFormat::Onnx);
    }

    #[test]
    fn test_seal_and_verify() {
        let artifact = ModelArtifact::linear("m", "1", 0.1, vec![1.0, 2.0, 3.0, 4.0]).seal();
        artifact.validate(&LoadOptions::default()).unwrap();

        let mut tampered = artifact.clone();
        tampered.model = ModelSpec::Linear {
            intercept: 0.2,
            coefficients: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert!(matches!(
            tampered.validate(&LoadOptions::default()),
            Err(ModelLoadError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_checksum_when_required() {
        let artifact = ModelArtifact::linear("m", "1", 0.0, vec![0.0; 4]);
        assert!(artifact.validate(&LoadOptions::default()).is_ok());
        let strict = LoadOptions {
            require_checksum: true,
            ..Default::default()
        };
        assert!(matches!(
            artifact.validate(&strict),
            Err(ModelLoadError::MissingChecksum)
        ));
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let mut artifact = ModelArtifact::linear("m", "1", 0.0, vec![0.0; 4]);
        artifact.feature_columns.swap(0, 1);
        assert!(matches!(
            artifact.validate(&LoadOptions::default()),
            Err(ModelLoadError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_coefficient_count() {
        let artifact = ModelArtifact::linear("m", "1", 0.0, vec![0.0; 3]);
        assert!(matches!(
            artifact.validate(&LoadOptions::default()),
            Err(ModelLoadError::IncompatibleFeatures {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_non_finite_coefficient() {
        let artifact = ModelArtifact::linear("m", "1", 0.0, vec![0.0, f64::INFINITY, 0.0, 0.0]);
        match artifact.validate(&LoadOptions::default()) {
            Err(ModelLoadError::NonFinite { name }) => assert_eq!(name, "coefficients[1]"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_format_version() {
        let mut artifact = ModelArtifact::linear("m", "1", 0.0, vec![0.0; 4]);
        artifact.format_version = 2;
        assert!(matches!(
            artifact.validate(&LoadOptions::default()),
            Err(ModelLoadError::UnsupportedFormatVersion {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn test_read_source_limits() {
        let options = LoadOptions {
            max_model_bytes: 8,
            ..Default::default()
        };
        assert!(matches!(
            ModelSource::Bytes(vec![]).read(&options),
            Err(ModelLoadError::Empty)
        ));
        assert!(matches!(
            ModelSource::Bytes(vec![b'x'; 9]).read(&options),
            Err(ModelLoadError::TooLarge { size: 9, max: 8 })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 16]).unwrap();
        assert!(matches!(
            ModelSource::Path(file.path().to_path_buf()).read(&options),
            Err(ModelLoadError::TooLarge { size: 16, max: 8 })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            ModelSource::Path(path).read(&LoadOptions::default()),
            Err(ModelLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_checksum_helper() {
        let checksum = compute_checksum(b"test data");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"test data"));
    }
}
