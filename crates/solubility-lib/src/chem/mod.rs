//! Cheminformatics core: SMILES parsing and the molecule queries the
//! descriptor calculator needs.

pub mod aromaticity;
pub mod crippen;
pub mod element;
pub mod molecule;
pub mod properties;
pub mod ring;
pub mod smiles;

pub use element::Element;
pub use molecule::{Atom, Bond, BondOrder, Molecule};
pub use smiles::parse_smiles;

use crate::error::ParseError;

/// Read-only queries over a parsed molecule
///
/// `log_p`, `molecular_weight` and `rotatable_bond_count` must follow the
/// conventions the bundled model was trained with (Wildman-Crippen logP,
/// average molecular weight including implicit hydrogens, strict rotatable
/// bond definition).
pub trait MoleculeView {
    /// Number of atom nodes in the graph, explicit hydrogens included
    fn atom_count(&self) -> usize;
    /// Whether the atom at `atom_idx` is aromatic; false when out of range
    fn is_aromatic(&self, atom_idx: usize) -> bool;
    fn heavy_atom_count(&self) -> usize;
    fn log_p(&self) -> f64;
    fn molecular_weight(&self) -> f64;
    fn rotatable_bond_count(&self) -> usize;
}

/// Turns a SMILES string into a queryable molecule
pub trait MoleculeParser: Send + Sync {
    type Molecule: MoleculeView;

    fn parse(&self, smiles: &str) -> Result<Self::Molecule, ParseError>;
}

/// Built-in SMILES parser
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesParser;

impl MoleculeParser for SmilesParser {
    type Molecule = Molecule;

    fn parse(&self, smiles: &str) -> Result<Molecule, ParseError> {
        parse_smiles(smiles)
    }
}
