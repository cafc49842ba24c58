//! Molecular weight and rotatable bond count

use super::element::atomic_weight;
use super::molecule::{BondOrder, Molecule};

const HYDROGEN_WEIGHT: f64 = 1.008;

/// Average molecular weight, implicit hydrogens included
pub fn molecular_weight(mol: &Molecule) -> f64 {
    mol.atoms()
        .iter()
        .map(|a| atomic_weight(a.atomic_number) + a.hydrogens as f64 * HYDROGEN_WEIGHT)
        .sum()
}

/// Number of rotatable bonds (strict definition).
///
/// A bond is rotatable when it is a single, acyclic bond between two
/// non-terminal heavy atoms, neither of which is part of a triple bond.
/// Amide, ester and thioamide C-X bonds and bonds to CF3, CCl3, CBr3 and
/// tert-butyl groups are excluded.
pub fn rotatable_bond_count(mol: &Molecule) -> usize {
    (0..mol.bond_count())
        .filter(|&bi| is_rotatable(mol, bi))
        .count()
}

fn is_rotatable(mol: &Molecule, bi: usize) -> bool {
    let bond = &mol.bonds()[bi];
    if bond.order != BondOrder::Single || mol.is_ring_bond(bi) {
        return false;
    }
    let (a, b) = (bond.begin, bond.end);
    if mol.atom(a).is_hydrogen() || mol.atom(b).is_hydrogen() {
        return false;
    }
    if blocks_rotation(mol, a) || blocks_rotation(mol, b) {
        return false;
    }
    !(is_amide_like(mol, a, b) || is_amide_like(mol, b, a))
}

fn blocks_rotation(mol: &Molecule, idx: usize) -> bool {
    mol.heavy_degree(idx) < 2 || has_triple_bond(mol, idx) || is_trisubstituted_cap(mol, idx)
}

fn has_triple_bond(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx)
        .iter()
        .any(|&(_, bi)| mol.bonds()[bi].order == BondOrder::Triple)
}

/// CF3, CCl3, CBr3 or C(CH3)3
fn is_trisubstituted_cap(mol: &Molecule, idx: usize) -> bool {
    if mol.atom(idx).atomic_number != 6 {
        return false;
    }
    let mut halogens = [0usize; 3];
    let mut methyls = 0;
    for &(n, _) in mol.neighbors(idx) {
        match mol.atom(n).atomic_number {
            9 => halogens[0] += 1,
            17 => halogens[1] += 1,
            35 => halogens[2] += 1,
            6 if mol.heavy_degree(n) == 1 && mol.total_hydrogens(n) == 3 => methyls += 1,
            _ => {}
        }
    }
    methyls >= 3 || halogens.iter().any(|&c| c >= 3)
}

/// `carbon` is a three-connected C double bonded to N, O or S and `other`
/// is N, O or S: the C-X bond of an amide, ester, thioamide or amidine
fn is_amide_like(mol: &Molecule, carbon: usize, other: usize) -> bool {
    if mol.atom(carbon).atomic_number != 6 || mol.heavy_degree(carbon) != 3 {
        return false;
    }
    if !matches!(mol.atom(other).atomic_number, 7 | 8 | 16) {
        return false;
    }
    mol.neighbors(carbon).iter().any(|&(n, bi)| {
        n != other
            && mol.bonds()[bi].order == BondOrder::Double
            && matches!(mol.atom(n).atomic_number, 7 | 8 | 16)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn mw(smiles: &str) -> f64 {
        molecular_weight(&parse_smiles(smiles).unwrap())
    }

    fn rotatable(smiles: &str) -> usize {
        rotatable_bond_count(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_molecular_weight() {
        assert!((mw("CCO") - 46.069).abs() < 1e-3);
        assert!((mw("c1ccccc1") - 78.114).abs() < 1e-3);
        assert!((mw("CC(=O)Oc1ccccc1C(=O)O") - 180.159).abs() < 0.01);
    }

    #[test]
    fn test_explicit_hydrogens_weigh_the_same() {
        assert!((mw("[H]C([H])([H])[H]") - mw("C")).abs() < 1e-9);
    }

    #[test]
    fn test_rotatable_bonds() {
        assert_eq!(rotatable("CCCC"), 1);
        assert_eq!(rotatable("CCO"), 0);
        assert_eq!(rotatable("c1ccccc1"), 0);
        assert_eq!(rotatable("c1ccccc1-c1ccccc1"), 1);
        assert_eq!(rotatable("CCCCCC"), 3);
    }

    #[test]
    fn test_rotatable_exclusions() {
        // amide C-N is not counted, the ethyl C-N bond is
        assert_eq!(rotatable("CC(=O)NCC"), 1);
        assert_eq!(rotatable("CC#CC"), 0);
        assert_eq!(rotatable("FC(F)(F)c1ccccc1"), 0);
        assert_eq!(rotatable("CC(C)(C)CCC"), 1);
        assert_eq!(rotatable("C1CCCCC1"), 0);
    }
}
