//! Molecular graph representation

use super::{crippen, properties, ring, MoleculeView};

/// Bond order classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Valence contribution, with aromatic bonds counted as one sigma bond
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

/// An atom in a molecular graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub aromatic: bool,
    /// Attached hydrogens that are not graph nodes
    pub hydrogens: u8,
    /// Written in brackets, so `hydrogens` was given explicitly
    pub bracket: bool,
}

impl Atom {
    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    /// The endpoint that is not `atom`
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// A molecule: atoms, bonds, adjacency and ring information
#[derive(Debug, Clone)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// adjacency[atom] = [(neighbor, bond_idx)]
    adjacency: Vec<Vec<(usize, usize)>>,
    rings: Vec<Vec<usize>>,
    ring_bonds: Vec<bool>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, bi));
            adjacency[bond.end].push((bond.begin, bi));
        }
        let ring_bonds = ring::ring_bond_flags(&adjacency, bonds.len());
        let rings = ring::find_sssr(&adjacency, &bonds, &ring_bonds);
        Self {
            atoms,
            bonds,
            adjacency,
            rings,
            ring_bonds,
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// (neighbor, bond index) pairs of an atom
    pub fn neighbors(&self, idx: usize) -> &[(usize, usize)] {
        &self.adjacency[idx]
    }

    /// Number of non-hydrogen neighbors
    pub fn heavy_degree(&self, idx: usize) -> usize {
        self.adjacency[idx]
            .iter()
            .filter(|&&(n, _)| !self.atoms[n].is_hydrogen())
            .count()
    }

    /// Implicit plus explicit (graph node) hydrogens on an atom
    pub fn total_hydrogens(&self, idx: usize) -> usize {
        let explicit = self.adjacency[idx]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].is_hydrogen())
            .count();
        self.atoms[idx].hydrogens as usize + explicit
    }

    /// Smallest set of smallest rings, as atom index cycles
    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings
    }

    pub fn is_ring_bond(&self, bond_idx: usize) -> bool {
        self.ring_bonds[bond_idx]
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| bi)
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub(crate) fn bonds_mut(&mut self) -> &mut [Bond] {
        &mut self.bonds
    }
}

impl MoleculeView for Molecule {
    fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    fn is_aromatic(&self, atom_idx: usize) -> bool {
        self.atoms.get(atom_idx).map(|a| a.aromatic).unwrap_or(false)
    }

    fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    fn log_p(&self) -> f64 {
        crippen::log_p(self)
    }

    fn molecular_weight(&self) -> f64 {
        properties::molecular_weight(self)
    }

    fn rotatable_bond_count(&self) -> usize {
        properties::rotatable_bond_count(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbon(hydrogens: u8) -> Atom {
        Atom {
            atomic_number: 6,
            formal_charge: 0,
            isotope: None,
            aromatic: false,
            hydrogens,
            bracket: false,
        }
    }

    #[test]
    fn test_adjacency_and_degree() {
        let mol = Molecule::new(
            vec![carbon(3), carbon(3)],
            vec![Bond {
                begin: 0,
                end: 1,
                order: BondOrder::Single,
            }],
        );
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.heavy_degree(0), 1);
        assert_eq!(mol.total_hydrogens(1), 3);
        assert_eq!(mol.bond_between(1, 0), Some(0));
        assert!(!mol.is_ring_bond(0));
        assert!(mol.rings().is_empty());
    }

    #[test]
    fn test_explicit_hydrogens_are_not_heavy() {
        let h = Atom {
            atomic_number: 1,
            bracket: true,
            ..carbon(0)
        };
        let mol = Molecule::new(
            vec![carbon(3), h],
            vec![Bond {
                begin: 0,
                end: 1,
                order: BondOrder::Single,
            }],
        );
        assert_eq!(mol.heavy_atom_count(), 1);
        assert_eq!(mol.heavy_degree(0), 0);
        assert_eq!(mol.total_hydrogens(0), 4);
    }

    #[test]
    fn test_out_of_range_aromatic_query() {
        let mol = Molecule::new(vec![carbon(4)], vec![]);
        assert!(!mol.is_aromatic(5));
    }
}
