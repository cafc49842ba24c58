//! Hückel aromaticity perception over SSSR rings
//!
//! Lowercase atoms are checked by `check_written` and then keep the aromatic
//! flag the SMILES gave them. Kekulé rings are promoted to aromatic when their
//! pi electron count is 4n + 2. Perception repeats until stable, so a ring
//! whose double bond points into a ring already found aromatic (fused Kekulé
//! systems) is picked up on a later pass.

use std::collections::VecDeque;

use super::molecule::{BondOrder, Molecule};

/// Upper bound on matching steps while kekulizing one molecule
const KEKULE_STEP_LIMIT: usize = 1 << 16;

/// Check that atoms written aromatic describe a real aromatic system.
///
/// Every aromatic atom must sit in a ring, the ring aromatic bonds must admit
/// a Kekulé structure, and once kekulized each aromatic atom must either be
/// picked up by Hückel perception or belong to a fused system whose whole
/// perimeter holds 4n + 2 pi electrons. Returns the first offending atom.
pub fn check_written(mol: &Molecule) -> Result<(), usize> {
    let written: Vec<bool> = mol.atoms().iter().map(|a| a.aromatic).collect();
    if !written.contains(&true) {
        return Ok(());
    }
    let in_ring = |idx: usize| mol.rings().iter().any(|ring| ring.contains(&idx));
    if let Some(idx) = (0..written.len()).find(|&i| written[i] && !in_ring(i)) {
        return Err(idx);
    }

    let mut open: Vec<bool> = (0..written.len())
        .map(|i| needs_double_bond(mol, i))
        .collect();
    let first_open = open.iter().position(|&o| o);
    let mut doubles = Vec::new();
    let mut steps = KEKULE_STEP_LIMIT;
    if !match_open_atoms(mol, &mut open, &mut doubles, &mut steps) {
        return Err(first_open.unwrap_or(0));
    }

    let mut kekule = mol.clone();
    for atom in kekule.atoms_mut() {
        atom.aromatic = false;
    }
    for (bi, bond) in kekule.bonds_mut().iter_mut().enumerate() {
        if bond.order == BondOrder::Aromatic {
            bond.order = if doubles.contains(&bi) {
                BondOrder::Double
            } else {
                BondOrder::Single
            };
        }
    }
    perceive(&mut kekule);

    let mut checked = vec![false; written.len()];
    for idx in 0..written.len() {
        if !written[idx] || kekule.atom(idx).aromatic || checked[idx] {
            continue;
        }
        let system = aromatic_system(mol, idx, &written);
        for &a in &system {
            checked[a] = true;
        }
        if !is_huckel(&kekule, &system) {
            return Err(idx);
        }
    }
    Ok(())
}

/// Valence for pi bookkeeping; elements outside this set never need a double
fn pi_valence(atomic_number: u8) -> Option<i32> {
    match atomic_number {
        5 | 7 | 15 | 33 => Some(3),
        6 => Some(4),
        8 | 16 | 34 | 52 => Some(2),
        _ => None,
    }
}

/// Whether an aromatic atom still has a free valence for a ring double bond
fn needs_double_bond(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    if !atom.aromatic {
        return false;
    }
    let Some(base) = pi_valence(atom.atomic_number) else {
        return false;
    };
    let charge = atom.formal_charge as i32;
    let valence = match atom.atomic_number {
        5 | 6 => base - charge.abs(),
        _ => base + charge,
    };
    let used: i32 = atom.hydrogens as i32
        + mol
            .neighbors(idx)
            .iter()
            .map(|&(_, bi)| mol.bonds()[bi].order.valence() as i32)
            .sum::<i32>();
    valence - used >= 1
}

fn double_bond_candidates(mol: &Molecule, atom: usize, open: &[bool]) -> Vec<(usize, usize)> {
    mol.neighbors(atom)
        .iter()
        .copied()
        .filter(|&(n, bi)| {
            open[n] && mol.is_ring_bond(bi) && mol.bonds()[bi].order == BondOrder::Aromatic
        })
        .collect()
}

/// Pair every open atom over a ring aromatic bond, most constrained first
fn match_open_atoms(
    mol: &Molecule,
    open: &mut [bool],
    doubles: &mut Vec<usize>,
    steps: &mut usize,
) -> bool {
    if *steps == 0 {
        return false;
    }
    *steps -= 1;

    let view: &[bool] = open;
    let next = (0..view.len())
        .filter(|&i| view[i])
        .map(|i| (i, double_bond_candidates(mol, i, view)))
        .min_by_key(|(_, candidates)| candidates.len());
    let Some((atom, candidates)) = next else {
        return true;
    };

    for (partner, bond) in candidates {
        open[atom] = false;
        open[partner] = false;
        doubles.push(bond);
        if match_open_atoms(mol, open, doubles, steps) {
            return true;
        }
        doubles.pop();
        open[atom] = true;
        open[partner] = true;
    }
    false
}

/// Written-aromatic atoms reachable from `start` over ring aromatic bonds
fn aromatic_system(mol: &Molecule, start: usize, written: &[bool]) -> Vec<usize> {
    let mut seen = vec![false; written.len()];
    let mut queue = VecDeque::from([start]);
    let mut system = Vec::new();
    seen[start] = true;
    while let Some(atom) = queue.pop_front() {
        system.push(atom);
        for &(n, bi) in mol.neighbors(atom) {
            let aromatic_bond =
                mol.is_ring_bond(bi) && mol.bonds()[bi].order == BondOrder::Aromatic;
            if written[n] && aromatic_bond && !seen[n] {
                seen[n] = true;
                queue.push_back(n);
            }
        }
    }
    system
}

pub fn perceive(mol: &mut Molecule) {
    let rings = mol.rings().to_vec();
    loop {
        let mut changed = false;
        for ring in &rings {
            let Some(ring_bonds) = ring_bond_indices(mol, ring) else {
                continue;
            };
            let already = ring.iter().all(|&a| mol.atom(a).aromatic)
                && ring_bonds
                    .iter()
                    .all(|&b| mol.bonds()[b].order == BondOrder::Aromatic);
            if already {
                continue;
            }
            if !is_huckel(mol, ring) {
                continue;
            }
            for &a in ring {
                mol.atoms_mut()[a].aromatic = true;
            }
            for &b in &ring_bonds {
                mol.bonds_mut()[b].order = BondOrder::Aromatic;
            }
            changed = true;
        }
        if !changed {
            break;
        }
    }
}

fn ring_bond_indices(mol: &Molecule, ring: &[usize]) -> Option<Vec<usize>> {
    (0..ring.len())
        .map(|i| mol.bond_between(ring[i], ring[(i + 1) % ring.len()]))
        .collect()
}

fn is_huckel(mol: &Molecule, ring: &[usize]) -> bool {
    let mut total = 0u32;
    for &atom in ring {
        match pi_electrons(mol, atom, ring) {
            Some(e) => total += e,
            None => return false,
        }
    }
    total % 4 == 2
}

/// Pi electrons an atom donates to `ring`, `None` when it breaks conjugation
fn pi_electrons(mol: &Molecule, idx: usize, ring: &[usize]) -> Option<u32> {
    let atom = mol.atom(idx);
    let mut ring_double = false;
    let mut exo_double = None;
    for &(n, bi) in mol.neighbors(idx) {
        match mol.bonds()[bi].order {
            BondOrder::Triple => return None,
            BondOrder::Double if ring.contains(&n) => ring_double = true,
            BondOrder::Double => exo_double = Some(n),
            _ => {}
        }
    }

    if ring_double {
        return Some(1);
    }
    if let Some(partner) = exo_double {
        let partner = mol.atom(partner);
        if partner.aromatic {
            return Some(1);
        }
        if atom.atomic_number == 6 && matches!(partner.atomic_number, 7 | 8 | 16) {
            return Some(0);
        }
        return None;
    }

    let connections = mol.neighbors(idx).len() + atom.hydrogens as usize;
    let charge = atom.formal_charge;
    if atom.aromatic {
        return Some(match atom.atomic_number {
            6 if charge < 0 => 2,
            6 if charge > 0 => 0,
            5 => 0,
            7 | 15 if charge == 0 && connections == 3 => 2,
            8 | 16 | 34 | 52 if charge == 0 => 2,
            _ => 1,
        });
    }
    match atom.atomic_number {
        6 if charge == -1 => Some(2),
        6 if charge == 1 => Some(0),
        7 | 15 if charge == 0 && connections == 3 => Some(2),
        8 | 16 | 34 | 52 if charge == 0 && connections == 2 => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::chem::{parse_smiles, MoleculeView};
    use crate::error::ParseErrorKind;

    fn aromatic_count(smiles: &str) -> usize {
        let mol = parse_smiles(smiles).unwrap();
        (0..mol.atom_count()).filter(|&i| mol.is_aromatic(i)).count()
    }

    #[test]
    fn test_kekule_benzene_is_aromatic() {
        assert_eq!(aromatic_count("C1=CC=CC=C1"), 6);
    }

    #[test]
    fn test_kekule_naphthalene_is_aromatic() {
        assert_eq!(aromatic_count("C1=CC=C2C=CC=CC2=C1"), 10);
    }

    #[test]
    fn test_five_membered_heteroaromatics() {
        assert_eq!(aromatic_count("C1=CNC=C1"), 5);
        assert_eq!(aromatic_count("C1=COC=C1"), 5);
        assert_eq!(aromatic_count("C1=CSC=C1"), 5);
    }

    #[test]
    fn test_non_aromatic_rings() {
        assert_eq!(aromatic_count("C1CCCCC1"), 0);
        assert_eq!(aromatic_count("C1=CCC=C1"), 0);
        assert_eq!(aromatic_count("C1=CC=CC=CC=C1"), 0);
        assert_eq!(aromatic_count("O=C1C=CC(=O)C=C1"), 0);
    }

    #[test]
    fn test_pyridone_is_aromatic() {
        assert_eq!(aromatic_count("O=C1C=CC=CN1"), 6);
    }

    #[test]
    fn test_substituent_stays_aliphatic() {
        assert_eq!(aromatic_count("Cc1ccccc1"), 6);
        assert_eq!(aromatic_count("c1ccc2c(c1)CCC2"), 6);
    }

    #[test]
    fn test_written_aromatic_systems_accepted() {
        assert_eq!(aromatic_count("c1cc[nH]c1"), 5);
        assert_eq!(aromatic_count("c1ccsc1"), 5);
        assert_eq!(aromatic_count("O=c1cccc[nH]1"), 6);
        assert_eq!(aromatic_count("C[n+]1ccccc1"), 6);
        assert_eq!(aromatic_count("[cH-]1cccc1"), 5);
        assert_eq!(aromatic_count("Cn1cnc2c1c(=O)n(C)c(=O)n2C"), 9);
    }

    #[test]
    fn test_fused_system_counted_as_a_whole() {
        // azulene: neither ring is 4n + 2 alone, the perimeter is
        assert_eq!(aromatic_count("c1ccc2cccc2cc1"), 10);
    }

    #[test]
    fn test_invalid_written_aromatics_rejected() {
        for smiles in ["c", "cc", "Cc", "c1cccc1", "c1ccnc1", "c1ccccccc1", "c1CCCC1"] {
            let err = parse_smiles(smiles).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::InvalidAromatic, "{smiles}");
        }
    }
}
