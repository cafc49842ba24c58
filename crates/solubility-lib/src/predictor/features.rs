//! Feature assembly
//!
//! Parses and describes every SMILES in a batch, stacking the successful
//! rows into a feature matrix in input order. Failed rows are kept out of the
//! matrix and reported with their index and original string.

use super::descriptors::DescriptorCalculator;
use crate::chem::MoleculeParser;
use crate::error::{BatchRejected, FeatureError, RowError, RowFailure};
use crate::models::{DescriptorVector, FeatureMatrix};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Batches at least this long are processed in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Minimum batch length for parallel row processing
    pub parallel_threshold: usize,
    /// Reject batches longer than this
    pub max_batch_size: Option<usize>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_batch_size: None,
        }
    }
}

/// Assembler output for one batch
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    pub matrix: FeatureMatrix,
    /// `row_index[i]` is the input position of matrix row `i`
    pub row_index: Vec<usize>,
    pub failures: Vec<RowFailure>,
    /// Length of the input batch
    pub total: usize,
}

impl FeatureBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Strict policy: the matrix only if every row succeeded
    pub fn into_complete(self) -> Result<FeatureMatrix, BatchRejected> {
        if self.failures.is_empty() {
            Ok(self.matrix)
        } else {
            Err(BatchRejected {
                total: self.total,
                failures: self.failures,
            })
        }
    }

    /// Descriptor vector of matrix row `row`
    pub fn descriptors(&self, row: usize) -> Option<DescriptorVector> {
        self.matrix.row(row).and_then(DescriptorVector::from_row)
    }
}

/// Builds feature matrices from SMILES batches
pub struct FeatureAssembler<P> {
    parser: P,
    calculator: DescriptorCalculator,
    config: AssemblerConfig,
}

impl<P: MoleculeParser> FeatureAssembler<P> {
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, AssemblerConfig::default())
    }

    pub fn with_config(parser: P, config: AssemblerConfig) -> Self {
        Self {
            parser,
            calculator: DescriptorCalculator::new(),
            config,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Parse and describe a single SMILES string
    pub fn describe(&self, smiles: &str) -> Result<DescriptorVector, RowError> {
        let mol = self.parser.parse(smiles)?;
        Ok(self.calculator.calculate(&mol)?)
    }

    pub fn assemble<S>(&self, smiles: &[S]) -> Result<FeatureBatch, FeatureError>
    where
        S: AsRef<str> + Sync,
    {
        if let Some(max) = self.config.max_batch_size {
            if smiles.len() > max {
                return Err(FeatureError::BatchTooLarge {
                    size: smiles.len(),
                    max,
                });
            }
        }

        let results = self.describe_all(smiles);

        let mut descriptors = Vec::with_capacity(results.len());
        let mut row_index = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(d) => {
                    descriptors.push(d);
                    row_index.push(index);
                }
                Err(error) => {
                    let smiles = smiles[index].as_ref();
                    debug!(index, smiles, error = %error, "Row excluded from feature matrix");
                    failures.push(RowFailure {
                        index,
                        smiles: smiles.to_string(),
                        error,
                    });
                }
            }
        }

        debug!(
            total = smiles.len(),
            rows = descriptors.len(),
            failed = failures.len(),
            "Feature matrix assembled"
        );

        Ok(FeatureBatch {
            matrix: FeatureMatrix::from_descriptors(&descriptors),
            row_index,
            failures,
            total: smiles.len(),
        })
    }

    /// Per-row results, in input order
    #[cfg(feature = "parallel")]
    fn describe_all<S>(&self, smiles: &[S]) -> Vec<Result<DescriptorVector, RowError>>
    where
        S: AsRef<str> + Sync,
    {
        if smiles.len() >= self.config.parallel_threshold {
            smiles.par_iter().map(|s| self.describe(s.as_ref())).collect()
        } else {
            smiles.iter().map(|s| self.describe(s.as_ref())).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn describe_all<S>(&self, smiles: &[S]) -> Vec<Result<DescriptorVector, RowError>>
    where
        S: AsRef<str> + Sync,
    {
        smiles.iter().map(|s| self.describe(s.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::SmilesParser;
    use crate::error::DescriptorError;
    use crate::models::NUM_FEATURES;

    fn assembler() -> FeatureAssembler<SmilesParser> {
        FeatureAssembler::new(SmilesParser)
    }

    #[test]
    fn test_valid_batch_keeps_order() {
        let batch = assembler().assemble(&["CCO", "c1ccccc1", "CCCC"]).unwrap();
        assert_eq!(batch.matrix.rows(), 3);
        assert_eq!(batch.matrix.columns(), NUM_FEATURES);
        assert_eq!(batch.row_index, vec![0, 1, 2]);
        assert!(batch.is_complete());
        assert_eq!(batch.descriptors(0).unwrap().aromatic_proportion, 0.0);
        assert_eq!(batch.descriptors(1).unwrap().aromatic_proportion, 1.0);
        assert_eq!(batch.descriptors(2).unwrap().rotatable_bonds, 1.0);
    }

    #[test]
    fn test_empty_batch() {
        let batch = assembler().assemble::<&str>(&[]).unwrap();
        assert!(batch.matrix.is_empty());
        assert_eq!(batch.matrix.columns(), NUM_FEATURES);
        assert_eq!(batch.total, 0);
        assert!(batch.failures.is_empty());
    }

    #[test]
    fn test_mixed_batch_reports_failures() {
        let input = vec![
            "CCO".to_string(),
            "not_a_smiles".to_string(),
            "[H][H]".to_string(),
            "c1ccccc1".to_string(),
        ];
        let batch = assembler().assemble(&input).unwrap();
        assert_eq!(batch.matrix.rows(), 2);
        assert_eq!(batch.row_index, vec![0, 3]);
        assert_eq!(batch.total, 4);
        assert_eq!(batch.failures.len(), 2);

        assert_eq!(batch.failures[0].index, 1);
        assert_eq!(batch.failures[0].smiles, "not_a_smiles");
        assert!(matches!(batch.failures[0].error, RowError::Parse(_)));

        assert_eq!(batch.failures[1].index, 2);
        assert_eq!(
            batch.failures[1].error,
            RowError::Descriptor(DescriptorError::NoHeavyAtoms)
        );
    }

    #[test]
    fn test_into_complete() {
        let ok = assembler().assemble(&["CCO"]).unwrap();
        assert_eq!(ok.into_complete().unwrap().rows(), 1);

        let bad = assembler().assemble(&["CCO", "C1CC"]).unwrap();
        let rejected = bad.into_complete().unwrap_err();
        assert_eq!(rejected.total, 2);
        assert_eq!(rejected.failures[0].index, 1);
    }

    #[test]
    fn test_batch_size_limit() {
        let assembler = FeatureAssembler::with_config(
            SmilesParser,
            AssemblerConfig {
                max_batch_size: Some(2),
                ..Default::default()
            },
        );
        let err = assembler.assemble(&["C", "CC", "CCC"]).unwrap_err();
        assert_eq!(err, FeatureError::BatchTooLarge { size: 3, max: 2 });
        assert!(assembler.assemble(&["C", "CC"]).is_ok());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let input: Vec<String> = ["CCO", "c1ccccc1", "bad!", "CC(=O)O", "Oc1ccccc1", "CCCC"]
            .iter()
            .cycle()
            .take(120)
            .map(|s| s.to_string())
            .collect();

        let sequential = FeatureAssembler::with_config(
            SmilesParser,
            AssemblerConfig {
                parallel_threshold: usize::MAX,
                ..Default::default()
            },
        )
        .assemble(&input)
        .unwrap();
        let parallel = FeatureAssembler::with_config(
            SmilesParser,
            AssemblerConfig {
                parallel_threshold: 0,
                ..Default::default()
            },
        )
        .assemble(&input)
        .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(sequential.failures.len(), 20);
    }
}
