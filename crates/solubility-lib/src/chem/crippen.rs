//! Wildman-Crippen atomic logP contributions
//!
//! Every heavy atom is assigned one atom type from its element, aromaticity,
//! hydrogen count, bond orders and neighbors. Hydrogens are typed by the atom
//! they are attached to. logP is the sum of the type contributions.

use super::molecule::{BondOrder, Molecule};

/// Crippen atom type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomType {
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
    C9,
    C10,
    C11,
    C12,
    C13,
    C14,
    C15,
    C16,
    C17,
    C18,
    C19,
    C20,
    C21,
    C22,
    C23,
    C24,
    C25,
    C26,
    C27,
    CS,
    H1,
    H2,
    H3,
    H4,
    HS,
    N1,
    N2,
    N3,
    N4,
    N5,
    N6,
    N7,
    N8,
    N9,
    N10,
    N11,
    N12,
    N13,
    N14,
    NS,
    O1,
    O2,
    O3,
    O4,
    O5,
    O6,
    O7,
    O8,
    O9,
    O10,
    O11,
    O12,
    OS,
    F,
    Cl,
    Br,
    I,
    Hal,
    P,
    S1,
    S2,
    S3,
    Other,
}

impl AtomType {
    pub fn contribution(self) -> f64 {
        use AtomType::*;
        match self {
            C1 => 0.1441,
            C2 => 0.0,
            C3 => -0.2035,
            C4 => -0.2051,
            C5 => -0.2783,
            C6 => 0.1551,
            C7 => 0.0017,
            C8 => 0.08452,
            C9 => -0.1444,
            C10 => -0.0516,
            C11 => 0.1193,
            C12 => -0.0967,
            C13 => -0.5443,
            C14 => 0.0,
            C15 => 0.245,
            C16 => 0.198,
            C17 => 0.0,
            C18 => 0.1581,
            C19 => 0.2955,
            C20 => 0.2713,
            C21 => 0.136,
            C22 => 0.4619,
            C23 => 0.5437,
            C24 => 0.1893,
            C25 => -0.8186,
            C26 => 0.264,
            C27 => 0.2148,
            CS => 0.08129,
            H1 => 0.123,
            H2 => -0.2677,
            H3 => 0.2142,
            H4 => 0.298,
            HS => 0.1125,
            N1 => -1.019,
            N2 => -0.7096,
            N3 => -1.027,
            N4 => -0.5188,
            N5 => 0.08387,
            N6 => 0.1836,
            N7 => -0.3187,
            N8 => -0.4458,
            N9 => 0.01508,
            N10 => -1.95,
            N11 => -0.3239,
            N12 => -1.119,
            N13 => -0.3396,
            N14 => 0.2887,
            NS => -0.4806,
            O1 => 0.1552,
            O2 => -0.2893,
            O3 => -0.0684,
            O4 => -0.4195,
            O5 => 0.0335,
            O6 => -0.3339,
            O7 => -1.189,
            O8 => 0.1788,
            O9 => -0.1526,
            O10 => 0.1129,
            O11 => 0.4833,
            O12 => -1.326,
            OS => -0.1188,
            F => 0.4202,
            Cl => 0.6895,
            Br => 0.8456,
            I => 0.8857,
            Hal => -2.996,
            P => 0.8612,
            S1 => 0.6482,
            S2 => -0.0024,
            S3 => 0.6237,
            Other => 0.0,
        }
    }
}

/// Wildman-Crippen logP of a molecule
pub fn log_p(mol: &Molecule) -> f64 {
    let mut total = 0.0;
    for (idx, atom) in mol.atoms().iter().enumerate() {
        if atom.is_hydrogen() {
            // Hydrogen nodes bonded to a heavy atom are counted with it
            let on_heavy = mol
                .neighbors(idx)
                .iter()
                .any(|&(n, _)| !mol.atom(n).is_hydrogen());
            if !on_heavy {
                total += AtomType::H1.contribution();
            }
            continue;
        }
        total += heavy_atom_type(mol, idx).contribution();
        let h = mol.total_hydrogens(idx) as f64;
        if h > 0.0 {
            total += h * hydrogen_type(mol, idx).contribution();
        }
    }
    total
}

/// Local environment of a heavy atom used for typing
struct Env {
    aromatic: bool,
    charge: i8,
    hydrogens: usize,
    /// (neighbor, bond order), hydrogen nodes excluded
    heavy: Vec<(usize, BondOrder)>,
}

impl Env {
    fn of(mol: &Molecule, idx: usize) -> Self {
        let atom = mol.atom(idx);
        let heavy = mol
            .neighbors(idx)
            .iter()
            .filter(|&&(n, _)| !mol.atom(n).is_hydrogen())
            .map(|&(n, bi)| (n, mol.bonds()[bi].order))
            .collect();
        Self {
            aromatic: atom.aromatic,
            charge: atom.formal_charge,
            hydrogens: mol.total_hydrogens(idx),
            heavy,
        }
    }

    fn partner(&self, order: BondOrder) -> Option<usize> {
        self.heavy.iter().find(|&&(_, o)| o == order).map(|&(n, _)| n)
    }

    fn has(&self, order: BondOrder) -> bool {
        self.partner(order).is_some()
    }
}

fn element(mol: &Molecule, idx: usize) -> u8 {
    mol.atom(idx).atomic_number
}

fn is_standard_hetero(z: u8) -> bool {
    matches!(z, 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
}

/// Whether carbon `idx` carries a double bond to C, N, O or S
fn has_double_to_cnos(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx).iter().any(|&(n, bi)| {
        mol.bonds()[bi].order == BondOrder::Double && matches!(element(mol, n), 6 | 7 | 8 | 16)
    })
}

pub fn heavy_atom_type(mol: &Molecule, idx: usize) -> AtomType {
    let env = Env::of(mol, idx);
    match element(mol, idx) {
        6 if env.aromatic => aromatic_carbon(mol, &env),
        6 => aliphatic_carbon(mol, &env),
        7 => nitrogen(mol, &env),
        8 => oxygen(mol, &env),
        9 | 17 | 35 | 53 if env.charge != 0 => AtomType::Hal,
        9 => AtomType::F,
        17 => AtomType::Cl,
        35 => AtomType::Br,
        53 => AtomType::I,
        15 => AtomType::P,
        16 if env.aromatic => AtomType::S3,
        16 if env.charge != 0 => AtomType::S2,
        16 => AtomType::S1,
        _ => AtomType::Other,
    }
}

fn aliphatic_carbon(mol: &Molecule, env: &Env) -> AtomType {
    if env.has(BondOrder::Triple) {
        return AtomType::C7;
    }
    if let Some(partner) = env.partner(BondOrder::Double) {
        if element(mol, partner) != 6 {
            return AtomType::C5;
        }
        let aromatic_neighbor = env.heavy.iter().any(|&(n, _)| mol.atom(n).aromatic);
        return if aromatic_neighbor {
            AtomType::C26
        } else {
            AtomType::C6
        };
    }
    if env.has(BondOrder::Aromatic) {
        return AtomType::CS;
    }

    if let Some(&(n, _)) = env.heavy.iter().find(|&&(n, _)| mol.atom(n).aromatic) {
        return match env.hydrogens {
            3 if element(mol, n) == 6 => AtomType::C8,
            3 => AtomType::C9,
            2 => AtomType::C10,
            1 => AtomType::C11,
            _ => AtomType::C12,
        };
    }

    let standard_hetero = env
        .heavy
        .iter()
        .any(|&(n, _)| is_standard_hetero(element(mol, n)));
    let other = env
        .heavy
        .iter()
        .any(|&(n, _)| element(mol, n) != 6 && !is_standard_hetero(element(mol, n)));
    match (standard_hetero, other) {
        (true, _) if env.hydrogens >= 2 => AtomType::C3,
        (true, _) => AtomType::C4,
        (false, true) => AtomType::C27,
        (false, false) if env.hydrogens >= 2 => AtomType::C1,
        (false, false) => AtomType::C2,
    }
}

fn aromatic_carbon(mol: &Molecule, env: &Env) -> AtomType {
    let substituent = env
        .heavy
        .iter()
        .find(|&&(_, order)| order != BondOrder::Aromatic)
        .copied();
    if let Some((n, _)) = substituent {
        match element(mol, n) {
            6 | 7 | 8 | 16 => {}
            9 => return AtomType::C14,
            17 => return AtomType::C15,
            35 => return AtomType::C16,
            53 => return AtomType::C17,
            _ => return AtomType::C13,
        }
    }
    if env.hydrogens > 0 {
        return AtomType::C18;
    }
    let aromatic_bonds = env
        .heavy
        .iter()
        .filter(|&&(_, order)| order == BondOrder::Aromatic)
        .count();
    if aromatic_bonds >= 3 {
        return AtomType::C19;
    }
    let Some((n, order)) = substituent else {
        return AtomType::CS;
    };
    if order == BondOrder::Double {
        return AtomType::C25;
    }
    if mol.atom(n).aromatic {
        return AtomType::C20;
    }
    match element(mol, n) {
        6 => AtomType::C21,
        7 => AtomType::C22,
        8 => AtomType::C23,
        16 => AtomType::C24,
        _ => AtomType::CS,
    }
}

fn nitrogen(mol: &Molecule, env: &Env) -> AtomType {
    if env.charge > 0 {
        return if env.aromatic {
            AtomType::N12
        } else if env.hydrogens > 0 {
            AtomType::N10
        } else {
            AtomType::N13
        };
    }
    if env.charge < 0 {
        return AtomType::N14;
    }
    if env.aromatic {
        return AtomType::N11;
    }
    if env.has(BondOrder::Triple) {
        return AtomType::N9;
    }
    if env.has(BondOrder::Double) {
        return if env.hydrogens > 0 {
            AtomType::N5
        } else {
            AtomType::N6
        };
    }
    if env.has(BondOrder::Aromatic) {
        return AtomType::NS;
    }
    let aromatic_neighbor = env.heavy.iter().any(|&(n, _)| mol.atom(n).aromatic);
    match (env.hydrogens, aromatic_neighbor) {
        (h, false) if h >= 2 => AtomType::N1,
        (h, true) if h >= 2 => AtomType::N3,
        (1, false) => AtomType::N2,
        (1, true) => AtomType::N4,
        (_, false) => AtomType::N7,
        (_, true) => AtomType::N8,
    }
}

fn oxygen(mol: &Molecule, env: &Env) -> AtomType {
    if env.aromatic {
        return AtomType::O1;
    }
    if env.charge < 0 {
        let Some(&(n, _)) = env.heavy.first() else {
            return AtomType::O7;
        };
        return match element(mol, n) {
            7 => AtomType::O5,
            16 => AtomType::O6,
            6 if carbonyl_carbon(mol, n) => AtomType::O12,
            _ => AtomType::O7,
        };
    }
    if let Some(partner) = env.partner(BondOrder::Double) {
        return match element(mol, partner) {
            7 | 8 => AtomType::O5,
            6 if mol.atom(partner).aromatic => AtomType::O8,
            6 => carbonyl_oxygen(mol, partner),
            _ => AtomType::OS,
        };
    }
    if env.hydrogens > 0 {
        return AtomType::O2;
    }
    if env.heavy.is_empty() {
        return AtomType::OS;
    }
    if env.heavy.iter().any(|&(n, _)| mol.atom(n).aromatic) {
        AtomType::O4
    } else {
        AtomType::O3
    }
}

fn carbonyl_carbon(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx).iter().any(|&(n, bi)| {
        mol.bonds()[bi].order == BondOrder::Double && element(mol, n) == 8
    })
}

/// Type of an aliphatic carbonyl oxygen from the carbonyl carbon's other
/// substituents
fn carbonyl_oxygen(mol: &Molecule, carbon: usize) -> AtomType {
    let others: Vec<usize> = mol
        .neighbors(carbon)
        .iter()
        .filter(|&&(n, bi)| {
            !mol.atom(n).is_hydrogen()
                && !(element(mol, n) == 8 && mol.bonds()[bi].order == BondOrder::Double)
        })
        .map(|&(n, _)| n)
        .collect();
    if others.iter().any(|&n| mol.atom(n).aromatic) {
        AtomType::O10
    } else if others.iter().filter(|&&n| element(mol, n) != 6).count() >= 2 {
        AtomType::O11
    } else {
        AtomType::O9
    }
}

/// Type shared by every hydrogen on heavy atom `idx`
pub fn hydrogen_type(mol: &Molecule, idx: usize) -> AtomType {
    match element(mol, idx) {
        6 => AtomType::H1,
        7 => AtomType::H3,
        8 => {
            let heavy: Vec<usize> = mol
                .neighbors(idx)
                .iter()
                .map(|&(n, _)| n)
                .filter(|&n| !mol.atom(n).is_hydrogen())
                .collect();
            let sp3_or_aromatic = |n: usize| {
                element(mol, n) == 6 && (mol.atom(n).aromatic || !has_multiple_bond(mol, n))
            };
            if heavy.iter().any(|&n| sp3_or_aromatic(n))
                || heavy
                    .iter()
                    .any(|&n| !matches!(element(mol, n), 6 | 7 | 8 | 16))
            {
                AtomType::H2
            } else if heavy.iter().any(|&n| element(mol, n) == 7) {
                AtomType::H3
            } else if heavy.iter().any(|&n| {
                (element(mol, n) == 6 && has_double_to_cnos(mol, n))
                    || matches!(element(mol, n), 8 | 16)
            }) {
                AtomType::H4
            } else {
                AtomType::HS
            }
        }
        _ => AtomType::H2,
    }
}

fn has_multiple_bond(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx)
        .iter()
        .any(|&(_, bi)| matches!(mol.bonds()[bi].order, BondOrder::Double | BondOrder::Triple))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn logp(smiles: &str) -> f64 {
        log_p(&parse_smiles(smiles).unwrap())
    }

    fn types(smiles: &str) -> Vec<AtomType> {
        let mol = parse_smiles(smiles).unwrap();
        (0..mol.atoms().len())
            .map(|i| heavy_atom_type(&mol, i))
            .collect()
    }

    #[test]
    fn test_reference_values() {
        assert!((logp("CCO") - -0.0014).abs() < 1e-4, "ethanol {}", logp("CCO"));
        assert!((logp("c1ccccc1") - 1.6866).abs() < 1e-4);
        assert!((logp("CC(=O)O") - 0.0909).abs() < 1e-4);
        assert!((logp("Oc1ccccc1") - 1.3922).abs() < 1e-4);
    }

    #[test]
    fn test_kekule_and_aromatic_forms_agree() {
        assert!((logp("C1=CC=CC=C1") - logp("c1ccccc1")).abs() < 1e-9);
    }

    #[test]
    fn test_carbon_types() {
        assert_eq!(types("CC(C)(C)C")[1], AtomType::C2);
        assert_eq!(types("CC#N")[1], AtomType::C7);
        assert_eq!(types("Cc1ccccc1")[0..2], [AtomType::C8, AtomType::C21]);
        assert_eq!(types("c1ccc2ccccc2c1")[3], AtomType::C19);
        assert_eq!(types("Clc1ccccc1")[1], AtomType::C15);
        assert_eq!(types("C=C")[0], AtomType::C6);
    }

    #[test]
    fn test_heteroatom_types() {
        assert_eq!(types("CN")[1], AtomType::N1);
        assert_eq!(types("Nc1ccccc1")[0], AtomType::N3);
        assert_eq!(types("c1ccncc1")[3], AtomType::N11);
        assert_eq!(types("COC")[1], AtomType::O3);
        assert_eq!(types("CC(C)=O")[3], AtomType::O9);
        assert_eq!(types("NC(N)=O")[3], AtomType::O11);
        assert_eq!(types("CC(=O)c1ccccc1")[2], AtomType::O10);
        assert_eq!(types("CC(=O)[O-]")[3], AtomType::O12);
        assert_eq!(types("[Cl-]")[0], AtomType::Hal);
    }

    #[test]
    fn test_hydrogen_types() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(hydrogen_type(&mol, 3), AtomType::H4);
        let mol = parse_smiles("CO").unwrap();
        assert_eq!(hydrogen_type(&mol, 1), AtomType::H2);
        assert_eq!(hydrogen_type(&mol, 0), AtomType::H1);
    }

    #[test]
    fn test_molecular_hydrogen() {
        assert!((logp("[H][H]") - 0.246).abs() < 1e-9);
    }
}
