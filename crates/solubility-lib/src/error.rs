//! Error taxonomy for the prediction core
//!
//! Row-level errors (`ParseError`, `DescriptorError`) are reported per input
//! row and never abort a batch. Model errors (`ModelLoadError`) are fatal to
//! loading; `PredictError` is fatal to a single prediction call only.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use thiserror::Error;

/// A SMILES string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position}")]
pub struct ParseError {
    /// Byte offset into the SMILES string where parsing stopped
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unknown element '{0}'")]
    UnknownElement(String),
    #[error("unterminated bracket atom")]
    UnterminatedBracket,
    #[error("malformed bracket atom")]
    MalformedBracket,
    #[error("unclosed ring closure {0}")]
    UnclosedRing(u16),
    #[error("invalid ring closure {0}")]
    InvalidRingClosure(u16),
    #[error("conflicting bond orders on ring closure {0}")]
    ConflictingRingBond(u16),
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,
    #[error("empty branch")]
    EmptyBranch,
    #[error("bond without an atom on both sides")]
    DanglingBond,
    #[error("ring closure without a preceding atom")]
    RingClosureWithoutAtom,
    #[error("aromatic atom outside a valid aromatic ring")]
    InvalidAromatic,
    #[error("atom exceeds its allowed valence")]
    InvalidValence,
}

/// A parsed molecule has no well-defined descriptor vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("molecule has no heavy atoms, aromatic proportion is undefined")]
    NoHeavyAtoms,
    #[error("descriptor {column} is not finite ({value})")]
    NonFinite { column: &'static str, value: f64 },
}

/// Why a single input row was excluded from the feature matrix
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("parse failure: {0}")]
    Parse(#[from] ParseError),
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}

impl RowError {
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::Parse(_) => "parse",
            RowError::Descriptor(_) => "descriptor",
        }
    }
}

impl Serialize for RowError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RowError", 2)?;
        state.serialize_field("kind", self.kind())?;
        let message = match self {
            RowError::Parse(e) => e.to_string(),
            RowError::Descriptor(e) => e.to_string(),
        };
        state.serialize_field("message", &message)?;
        state.end()
    }
}

/// One input row that did not make it into the feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("row {index} ({smiles:?}): {error}")]
pub struct RowFailure {
    /// Position of the row in the caller's input list
    pub index: usize,
    /// The original input string, unmodified
    pub smiles: String,
    pub error: RowError,
}

/// Batch-level feature assembly errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("batch of {size} molecules exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

/// A batch rejected under the strict policy because some rows failed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} of {total} rows failed", failures.len())]
pub struct BatchRejected {
    pub total: usize,
    pub failures: Vec<RowFailure>,
}

/// The model artifact could not be turned into a usable model
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is empty")]
    Empty,
    #[error("model artifact of {size} bytes exceeds the limit of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("corrupt model artifact: {0}")]
    Corrupt(String),
    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedFormatVersion { expected: u32, found: u32 },
    #[error("model expects {found} features, pipeline produces {expected}")]
    IncompatibleFeatures { expected: usize, found: usize },
    #[error("model feature columns {found:?} do not match {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("model parameter {name} is not finite")]
    NonFinite { name: String },
    #[error("artifact checksum is required but missing")]
    MissingChecksum,
    #[error("checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },
}

/// A prediction call failed; the loaded model stays usable
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model not loaded")]
    ModelNotLoaded,
    #[error("feature matrix has {found} columns, model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("model produced a non-finite prediction for row {row}")]
    NonFinitePrediction { row: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("batch rejected: {0}")]
    Rejected(#[from] BatchRejected),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_serializes_kind_and_message() {
        let failure = RowFailure {
            index: 3,
            smiles: "C1CC".to_string(),
            error: ParseError::new(4, ParseErrorKind::UnclosedRing(1)).into(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["smiles"], "C1CC");
        assert_eq!(json["error"]["kind"], "parse");
        assert_eq!(
            json["error"]["message"],
            "unclosed ring closure 1 at position 4"
        );
    }

    #[test]
    fn test_descriptor_error_kind() {
        let err: RowError = DescriptorError::NoHeavyAtoms.into();
        assert_eq!(err.kind(), "descriptor");
    }

    #[test]
    fn test_batch_rejected_message() {
        let rejected = BatchRejected {
            total: 5,
            failures: vec![RowFailure {
                index: 0,
                smiles: String::new(),
                error: DescriptorError::NoHeavyAtoms.into(),
            }],
        };
        assert_eq!(rejected.to_string(), "1 of 5 rows failed");
    }
}
