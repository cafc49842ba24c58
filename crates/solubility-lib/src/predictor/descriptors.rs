//! Descriptor calculation
//!
//! Turns a parsed molecule into the four-value descriptor vector the model
//! consumes. LogP, molecular weight and rotatable bonds come straight from
//! the chemistry engine; aromatic proportion is computed here.

use crate::chem::MoleculeView;
use crate::error::DescriptorError;
use crate::models::{DescriptorVector, FEATURE_COLUMNS};

/// Computes descriptor vectors from molecules. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorCalculator;

impl DescriptorCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate<M: MoleculeView + ?Sized>(
        &self,
        mol: &M,
    ) -> Result<DescriptorVector, DescriptorError> {
        let descriptors = DescriptorVector {
            log_p: mol.log_p(),
            molecular_weight: mol.molecular_weight(),
            rotatable_bonds: mol.rotatable_bond_count() as f64,
            aromatic_proportion: aromatic_proportion(mol)?,
        };

        for (column, value) in FEATURE_COLUMNS.into_iter().zip(descriptors.to_row()) {
            if !value.is_finite() {
                return Err(DescriptorError::NonFinite { column, value });
            }
        }
        Ok(descriptors)
    }
}

/// Aromatic atoms over heavy atoms
pub fn aromatic_proportion<M: MoleculeView + ?Sized>(mol: &M) -> Result<f64, DescriptorError> {
    let heavy = mol.heavy_atom_count();
    if heavy == 0 {
        return Err(DescriptorError::NoHeavyAtoms);
    }
    let aromatic = (0..mol.atom_count())
        .filter(|&idx| mol.is_aromatic(idx))
        .count();
    Ok(aromatic as f64 / heavy as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn describe(smiles: &str) -> Result<DescriptorVector, DescriptorError> {
        DescriptorCalculator::new().calculate(&parse_smiles(smiles).unwrap())
    }

    /// Hand-built molecule for exercising the error paths
    struct Fixed {
        atoms: usize,
        aromatic: usize,
        log_p: f64,
    }

    impl MoleculeView for Fixed {
        fn atom_count(&self) -> usize {
            self.atoms
        }
        fn is_aromatic(&self, idx: usize) -> bool {
            idx < self.aromatic
        }
        fn heavy_atom_count(&self) -> usize {
            self.atoms
        }
        fn log_p(&self) -> f64 {
            self.log_p
        }
        fn molecular_weight(&self) -> f64 {
            12.0 * self.atoms as f64
        }
        fn rotatable_bond_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_ethanol_and_benzene() {
        let ethanol = describe("CCO").unwrap();
        assert_eq!(ethanol.aromatic_proportion, 0.0);
        assert!((ethanol.molecular_weight - 46.069).abs() < 1e-2);
        assert!((ethanol.log_p - -0.0014).abs() < 1e-3);
        assert_eq!(ethanol.rotatable_bonds, 0.0);

        let benzene = describe("c1ccccc1").unwrap();
        assert_eq!(benzene.aromatic_proportion, 1.0);
        assert!((benzene.log_p - 1.6866).abs() < 1e-3);
    }

    #[test]
    fn test_kekule_benzene_proportion() {
        assert_eq!(describe("C1=CC=CC=C1").unwrap().aromatic_proportion, 1.0);
    }

    #[test]
    fn test_partial_aromatic_proportion() {
        // toluene: 6 of 7 heavy atoms aromatic
        let toluene = describe("Cc1ccccc1").unwrap();
        assert!((toluene.aromatic_proportion - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_hydrogens_do_not_count() {
        let d = describe("[H]c1ccccc1").unwrap();
        assert_eq!(d.aromatic_proportion, 1.0);
    }

    #[test]
    fn test_no_heavy_atoms() {
        assert_eq!(describe("[H][H]"), Err(DescriptorError::NoHeavyAtoms));
        assert_eq!(describe(""), Err(DescriptorError::NoHeavyAtoms));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let mol = Fixed {
            atoms: 3,
            aromatic: 0,
            log_p: f64::NAN,
        };
        let err = DescriptorCalculator::new().calculate(&mol).unwrap_err();
        assert!(matches!(err, DescriptorError::NonFinite { column: "MolLogP", .. }));
    }

    #[test]
    fn test_proportion_bounds() {
        let mol = Fixed {
            atoms: 4,
            aromatic: 4,
            log_p: 0.0,
        };
        let d = DescriptorCalculator::new().calculate(&mol).unwrap();
        assert!((0.0..=1.0).contains(&d.aromatic_proportion));
    }
}
