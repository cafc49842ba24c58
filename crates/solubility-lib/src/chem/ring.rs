//! Ring perception: ring bonds and the smallest set of smallest rings

use super::molecule::Bond;
use std::collections::VecDeque;

type Adjacency = [Vec<(usize, usize)>];

/// Flag every bond that lies on a cycle.
///
/// A bond is a ring bond iff its endpoints stay connected without it.
pub fn ring_bond_flags(adjacency: &Adjacency, bond_count: usize) -> Vec<bool> {
    let mut flags = vec![false; bond_count];
    for (atom, edges) in adjacency.iter().enumerate() {
        for &(neighbor, bond_idx) in edges {
            if neighbor < atom || flags[bond_idx] {
                continue;
            }
            flags[bond_idx] = shortest_path(adjacency, atom, neighbor, bond_idx, None).is_some();
        }
    }
    flags
}

/// Smallest set of smallest rings.
///
/// For every ring bond the shortest cycle through it is collected; the
/// distinct cycles are sorted by size and truncated to the cyclomatic number.
pub fn find_sssr(adjacency: &Adjacency, bonds: &[Bond], ring_bonds: &[bool]) -> Vec<Vec<usize>> {
    let atom_count = adjacency.len();
    if atom_count == 0 || !ring_bonds.iter().any(|&r| r) {
        return Vec::new();
    }
    let expected = bonds.len() + count_components(adjacency) - atom_count;

    let mut rings: Vec<Vec<usize>> = Vec::new();
    for (bond_idx, bond) in bonds.iter().enumerate() {
        if !ring_bonds[bond_idx] {
            continue;
        }
        if let Some(mut ring) =
            shortest_path(adjacency, bond.begin, bond.end, bond_idx, Some(ring_bonds))
        {
            normalize_ring(&mut ring);
            if !rings.contains(&ring) {
                rings.push(ring);
            }
        }
    }

    rings.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    rings.truncate(expected);
    rings
}

fn count_components(adjacency: &Adjacency) -> usize {
    let mut visited = vec![false; adjacency.len()];
    let mut components = 0;
    for start in 0..adjacency.len() {
        if visited[start] {
            continue;
        }
        components += 1;
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(curr) = queue.pop_front() {
            for &(n, _) in &adjacency[curr] {
                if !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    components
}

/// BFS path from `start` to `end` that does not use `excluded_bond`,
/// optionally restricted to ring bonds. Returns the atoms on the path.
fn shortest_path(
    adjacency: &Adjacency,
    start: usize,
    end: usize,
    excluded_bond: usize,
    allowed: Option<&[bool]>,
) -> Option<Vec<usize>> {
    let mut parent = vec![usize::MAX; adjacency.len()];
    let mut visited = vec![false; adjacency.len()];
    visited[start] = true;
    let mut queue = VecDeque::from([start]);

    while let Some(curr) = queue.pop_front() {
        if curr == end {
            let mut path = vec![end];
            let mut node = end;
            while node != start {
                node = parent[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &(n, bi) in &adjacency[curr] {
            if bi == excluded_bond || visited[n] {
                continue;
            }
            if let Some(allowed) = allowed {
                if !allowed[bi] {
                    continue;
                }
            }
            visited[n] = true;
            parent[n] = curr;
            queue.push_back(n);
        }
    }
    None
}

/// Rotate so the smallest index comes first, then pick the direction with
/// the smaller second element.
fn normalize_ring(ring: &mut [usize]) {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| v)
        .map(|(i, _)| i)
    else {
        return;
    };
    ring.rotate_left(min_pos);
    let n = ring.len();
    if n > 2 && ring[n - 1] < ring[1] {
        ring[1..].reverse();
    }
}

#[cfg(test)]
mod tests {
    use crate::chem::parse_smiles;

    #[test]
    fn test_benzene_one_ring() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.rings().len(), 1);
        assert_eq!(mol.rings()[0], vec![0, 1, 2, 3, 4, 5]);
        assert!((0..mol.bond_count()).all(|b| mol.is_ring_bond(b)));
    }

    #[test]
    fn test_naphthalene_two_rings() {
        let mol = parse_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(mol.rings().len(), 2);
        assert!(mol.rings().iter().all(|r| r.len() == 6));
    }

    #[test]
    fn test_biphenyl_link_is_not_a_ring_bond() {
        let mol = parse_smiles("c1ccccc1-c1ccccc1").unwrap();
        assert_eq!(mol.rings().len(), 2);
        let link = mol.bond_between(5, 6).unwrap();
        assert!(!mol.is_ring_bond(link));
    }

    #[test]
    fn test_acyclic_has_no_rings() {
        let mol = parse_smiles("CCCC").unwrap();
        assert!(mol.rings().is_empty());
        assert!((0..mol.bond_count()).all(|b| !mol.is_ring_bond(b)));
    }
}
