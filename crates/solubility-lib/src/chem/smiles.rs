//! SMILES parser
//!
//! Supports the organic subset, bracket atoms (isotope, chirality, hydrogen
//! count, charge, atom class), branches, ring closures (`1`..`9`, `%nn`),
//! explicit bond symbols and dot-disconnected fragments. Stereo bond marks
//! `/` and `\` are read as single bonds. Leading whitespace is skipped and
//! parsing stops at the next whitespace character, so trailing names on a
//! line are ignored.
//!
//! Neutral atoms may not exceed their largest default valence, and lowercase
//! atoms must form a ring system that kekulizes to 4n + 2 pi electrons.

use std::collections::BTreeMap;

use super::aromaticity;
use super::element::{element_by_number, element_by_symbol, Element};
use super::molecule::{Atom, Bond, BondOrder, Molecule};
use crate::error::{ParseError, ParseErrorKind};

/// Parse a SMILES string into a `Molecule` with implicit hydrogens assigned
/// and aromaticity perceived.
///
/// An empty string parses to an empty molecule.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, ParseError> {
    let mut parser = Parser::new(smiles);
    parser.parse()?;
    parser.finish()?;
    parser.assign_implicit_hydrogens();
    parser.check_valence()?;

    let positions = parser.positions;
    let mut molecule = Molecule::new(parser.atoms, parser.bonds);
    aromaticity::check_written(&molecule)
        .map_err(|atom| ParseError::new(positions[atom], ParseErrorKind::InvalidAromatic))?;
    aromaticity::perceive(&mut molecule);
    Ok(molecule)
}

struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    /// Byte offset where each atom starts
    positions: Vec<usize>,
    bonds: Vec<Bond>,
    ring_openings: BTreeMap<u16, RingOpening>,
    /// (atom the branch hangs off, position of the '(')
    branches: Vec<(usize, usize)>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            positions: Vec::new(),
            bonds: Vec::new(),
            ring_openings: BTreeMap::new(),
            branches: Vec::new(),
            prev_atom: None,
            pending_bond: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, kind)
    }

    fn parse(&mut self) -> Result<(), ParseError> {
        while self.peek().is_some_and(is_whitespace) {
            self.advance();
        }
        while let Some(ch) = self.peek() {
            match ch {
                _ if is_whitespace(ch) => break,
                b'(' => self.open_branch()?,
                b')' => self.close_branch()?,
                b'-' | b'/' | b'\\' => self.bond_symbol(BondOrder::Single)?,
                b'=' => self.bond_symbol(BondOrder::Double)?,
                b'#' => self.bond_symbol(BondOrder::Triple)?,
                b':' => self.bond_symbol(BondOrder::Aromatic)?,
                b'.' => {
                    if self.prev_atom.is_none() {
                        return Err(self.error(ParseErrorKind::UnexpectedCharacter('.')));
                    }
                    if self.pending_bond.is_some() {
                        return Err(self.error(ParseErrorKind::DanglingBond));
                    }
                    self.advance();
                    self.prev_atom = None;
                }
                b'%' => {
                    let start = self.pos;
                    self.advance();
                    let ring = match (self.peek(), self.peek_at(1)) {
                        (Some(d1), Some(d2)) if d1.is_ascii_digit() && d2.is_ascii_digit() => {
                            self.pos += 2;
                            (d1 - b'0') as u16 * 10 + (d2 - b'0') as u16
                        }
                        _ => {
                            return Err(ParseError::new(
                                start,
                                ParseErrorKind::UnexpectedCharacter('%'),
                            ))
                        }
                    };
                    self.ring_closure(ring, start)?;
                }
                b'0'..=b'9' => {
                    let start = self.pos;
                    self.advance();
                    self.ring_closure((ch - b'0') as u16, start)?;
                }
                b'[' => self.bracket_atom()?,
                _ if is_organic_start(ch) => self.organic_atom()?,
                _ => return Err(self.error(ParseErrorKind::UnexpectedCharacter(ch as char))),
            }
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.pending_bond.is_some() {
            return Err(self.error(ParseErrorKind::DanglingBond));
        }
        if let Some(&(_, open_pos)) = self.branches.last() {
            return Err(ParseError::new(
                open_pos,
                ParseErrorKind::UnbalancedParentheses,
            ));
        }
        if let Some((&ring, _)) = self.ring_openings.iter().next() {
            return Err(self.error(ParseErrorKind::UnclosedRing(ring)));
        }
        Ok(())
    }

    fn open_branch(&mut self) -> Result<(), ParseError> {
        let Some(prev) = self.prev_atom else {
            return Err(self.error(ParseErrorKind::UnexpectedCharacter('(')));
        };
        if self.pending_bond.is_some() {
            return Err(self.error(ParseErrorKind::DanglingBond));
        }
        if self.peek_at(1) == Some(b')') {
            return Err(self.error(ParseErrorKind::EmptyBranch));
        }
        self.branches.push((prev, self.pos));
        self.advance();
        Ok(())
    }

    fn close_branch(&mut self) -> Result<(), ParseError> {
        if self.pending_bond.is_some() {
            return Err(self.error(ParseErrorKind::DanglingBond));
        }
        let Some((anchor, _)) = self.branches.pop() else {
            return Err(self.error(ParseErrorKind::UnbalancedParentheses));
        };
        self.advance();
        self.prev_atom = Some(anchor);
        Ok(())
    }

    fn bond_symbol(&mut self, order: BondOrder) -> Result<(), ParseError> {
        if self.prev_atom.is_none() || self.pending_bond.is_some() {
            return Err(self.error(ParseErrorKind::DanglingBond));
        }
        self.advance();
        self.pending_bond = Some(order);
        Ok(())
    }

    fn ring_closure(&mut self, ring: u16, start: usize) -> Result<(), ParseError> {
        let Some(current) = self.prev_atom else {
            return Err(ParseError::new(
                start,
                ParseErrorKind::RingClosureWithoutAtom,
            ));
        };
        let pending = self.pending_bond.take();

        let Some(opening) = self.ring_openings.remove(&ring) else {
            self.ring_openings.insert(
                ring,
                RingOpening {
                    atom: current,
                    order: pending,
                },
            );
            return Ok(());
        };

        if opening.atom == current || self.has_bond(opening.atom, current) {
            return Err(ParseError::new(
                start,
                ParseErrorKind::InvalidRingClosure(ring),
            ));
        }
        let order = match (opening.order, pending) {
            (Some(a), Some(b)) if a != b => {
                return Err(ParseError::new(
                    start,
                    ParseErrorKind::ConflictingRingBond(ring),
                ))
            }
            (Some(a), _) | (None, Some(a)) => a,
            (None, None) => self.default_order(opening.atom, current),
        };
        self.bonds.push(Bond {
            begin: opening.atom,
            end: current,
            order,
        });
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(());
        };
        let symbol = match ch {
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                "Br"
            }
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                "Cl"
            }
            b'B' => "B",
            b'C' => "C",
            b'N' => "N",
            b'O' => "O",
            b'P' => "P",
            b'S' => "S",
            b'F' => "F",
            b'I' => "I",
            b'b' => "B",
            b'c' => "C",
            b'n' => "N",
            b'o' => "O",
            b'p' => "P",
            b's' => "S",
            _ => {
                return Err(ParseError::new(
                    start,
                    ParseErrorKind::UnexpectedCharacter(ch as char),
                ))
            }
        };
        let element = lookup(symbol, start)?;
        self.push_atom(
            Atom {
                atomic_number: element.atomic_number,
                formal_charge: 0,
                isotope: None,
                aromatic: ch.is_ascii_lowercase(),
                hydrogens: 0,
                bracket: false,
            },
            start,
        );
        Ok(())
    }

    fn bracket_atom(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.advance(); // '['
        let isotope = self.number().map(|n| n.min(u16::MAX as u32) as u16);

        let (element, aromatic) = self.bracket_symbol()?;
        self.skip_chirality();

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            hydrogens = match self.number() {
                Some(n) => n.min(u8::MAX as u32) as u8,
                None => 1,
            };
        }

        let formal_charge = self.charge();

        if self.peek() == Some(b':') {
            self.advance();
            if self.number().is_none() {
                return Err(self.error(ParseErrorKind::MalformedBracket));
            }
        }

        match self.peek() {
            Some(b']') => {
                self.advance();
            }
            None => return Err(self.error(ParseErrorKind::UnterminatedBracket)),
            Some(_) => return Err(self.error(ParseErrorKind::MalformedBracket)),
        }

        self.push_atom(
            Atom {
                atomic_number: element.atomic_number,
                formal_charge,
                isotope,
                aromatic,
                hydrogens,
                bracket: true,
            },
            start,
        );
        Ok(())
    }

    fn bracket_symbol(&mut self) -> Result<(&'static Element, bool), ParseError> {
        let start = self.pos;
        let first = match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => ch,
            Some(_) => return Err(self.error(ParseErrorKind::MalformedBracket)),
            None => return Err(self.error(ParseErrorKind::UnterminatedBracket)),
        };
        let aromatic = first.is_ascii_lowercase();
        let upper = first.to_ascii_uppercase() as char;

        // Two-letter symbols win over one-letter ones: [Cl], [Se], [se], [as]
        if let Some(second) = self.peek_at(1).filter(u8::is_ascii_lowercase) {
            let two = format!("{}{}", upper, second as char);
            let allowed = !aromatic || matches!(two.as_str(), "Se" | "As" | "Te");
            if allowed {
                if let Some(element) = element_by_symbol(&two) {
                    self.pos += 2;
                    return Ok((element, aromatic));
                }
            }
        }

        if aromatic && !matches!(first, b'b' | b'c' | b'n' | b'o' | b'p' | b's') {
            return Err(ParseError::new(
                start,
                ParseErrorKind::UnknownElement((first as char).to_string()),
            ));
        }
        let element = lookup(&upper.to_string(), start)?;
        self.advance();
        Ok((element, aromatic))
    }

    fn skip_chirality(&mut self) {
        if self.peek() != Some(b'@') {
            return;
        }
        self.advance();
        if self.peek() == Some(b'@') {
            self.advance();
            return;
        }
        let class = (self.peek(), self.peek_at(1));
        if matches!(
            class,
            (Some(b'T'), Some(b'H'))
                | (Some(b'A'), Some(b'L'))
                | (Some(b'S'), Some(b'P'))
                | (Some(b'T'), Some(b'B'))
                | (Some(b'O'), Some(b'H'))
        ) {
            self.pos += 2;
            self.number();
        }
    }

    fn charge(&mut self) -> i8 {
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return 0,
        };
        let symbol = self.peek();
        self.advance();
        if let Some(n) = self.number() {
            return sign * n.min(15) as i8;
        }
        let mut magnitude = 1i8;
        while self.peek() == symbol && magnitude < 15 {
            self.advance();
            magnitude += 1;
        }
        sign * magnitude
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(ch) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            value = Some(
                value
                    .unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add((ch - b'0') as u32),
            );
        }
        value
    }

    fn push_atom(&mut self, atom: Atom, start: usize) {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        self.positions.push(start);
        if let Some(prev) = self.prev_atom {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_order(prev, idx));
            self.bonds.push(Bond {
                begin: prev,
                end: idx,
                order,
            });
        }
        self.prev_atom = Some(idx);
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn has_bond(&self, a: usize, b: usize) -> bool {
        self.bonds
            .iter()
            .any(|bond| (bond.begin == a && bond.end == b) || (bond.begin == b && bond.end == a))
    }

    /// Fill in hydrogens for atoms written without brackets.
    ///
    /// Aromatic atoms keep one valence for the pi system and count every bond
    /// as one. Aliphatic atoms take the smallest default valence that covers
    /// their bond order sum.
    fn assign_implicit_hydrogens(&mut self) {
        let (degree, order_sum) = self.bond_totals();

        for (idx, atom) in self.atoms.iter_mut().enumerate() {
            if atom.bracket {
                continue;
            }
            let Some(valences) = element_by_number(atom.atomic_number)
                .map(|e| e.default_valences)
                .filter(|v| !v.is_empty())
            else {
                continue;
            };
            let hydrogens = if atom.aromatic {
                (valences[0] as u32).saturating_sub(degree[idx] + 1)
            } else {
                valences
                    .iter()
                    .map(|&v| v as u32)
                    .find(|&v| v >= order_sum[idx])
                    .map(|v| v - order_sum[idx])
                    .unwrap_or(0)
            };
            atom.hydrogens = hydrogens.min(u8::MAX as u32) as u8;
        }
    }

    /// Reject neutral atoms whose bond orders plus hydrogens go past the
    /// largest default valence of their element. Aromatic bonds count as one.
    fn check_valence(&self) -> Result<(), ParseError> {
        let (_, order_sum) = self.bond_totals();
        for (idx, atom) in self.atoms.iter().enumerate() {
            if atom.formal_charge != 0 {
                continue;
            }
            let Some(&max) = element_by_number(atom.atomic_number)
                .and_then(|e| e.default_valences.last())
            else {
                continue;
            };
            if order_sum[idx] + atom.hydrogens as u32 > max as u32 {
                return Err(ParseError::new(
                    self.positions[idx],
                    ParseErrorKind::InvalidValence,
                ));
            }
        }
        Ok(())
    }

    /// Per-atom (bond count, bond order sum)
    fn bond_totals(&self) -> (Vec<u32>, Vec<u32>) {
        let mut degree = vec![0u32; self.atoms.len()];
        let mut order_sum = vec![0u32; self.atoms.len()];
        for bond in &self.bonds {
            for end in [bond.begin, bond.end] {
                degree[end] += 1;
                order_sum[end] += bond.order.valence() as u32;
            }
        }
        (degree, order_sum)
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_organic_start(ch: u8) -> bool {
    matches!(
        ch,
        b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I' | b'b' | b'c' | b'n' | b'o' | b'p'
            | b's'
    )
}

fn lookup(symbol: &str, position: usize) -> Result<&'static Element, ParseError> {
    element_by_symbol(symbol).ok_or_else(|| {
        ParseError::new(position, ParseErrorKind::UnknownElement(symbol.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::MoleculeView;

    fn kind(smiles: &str) -> ParseErrorKind {
        parse_smiles(smiles).unwrap_err().kind
    }

    #[test]
    fn test_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atom(0).hydrogens, 3);
        assert_eq!(mol.atom(1).hydrogens, 2);
        assert_eq!(mol.atom(2).hydrogens, 1);
    }

    #[test]
    fn test_branches_and_bond_orders() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        let carbonyl = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bonds()[carbonyl].order, BondOrder::Double);
        assert!(mol.bond_between(1, 3).is_some());
        assert_eq!(mol.atom(1).hydrogens, 0);
        assert_eq!(mol.atom(3).hydrogens, 1);
    }

    #[test]
    fn test_aromatic_ring() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.bond_count(), 6);
        assert!((0..6).all(|i| mol.is_aromatic(i)));
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert!(mol.atoms().iter().all(|a| a.hydrogens == 1));
    }

    #[test]
    fn test_pyridine_nitrogen_has_no_hydrogen() {
        let mol = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(mol.atom(3).atomic_number, 7);
        assert_eq!(mol.atom(3).hydrogens, 0);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("[13CH4]").unwrap();
        assert_eq!(mol.atom(0).isotope, Some(13));
        assert_eq!(mol.atom(0).hydrogens, 4);

        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atom(0).formal_charge, 1);
        assert_eq!(mol.atom(0).hydrogens, 4);

        let mol = parse_smiles("[O-]C(=O)C").unwrap();
        assert_eq!(mol.atom(0).formal_charge, -1);
        assert_eq!(mol.atom(0).hydrogens, 0);

        let mol = parse_smiles("[Fe++]").unwrap();
        assert_eq!(mol.atom(0).formal_charge, 2);

        let mol = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(mol.atom(1).hydrogens, 1);

        let mol = parse_smiles("[CH3:1]C").unwrap();
        assert_eq!(mol.atom_count(), 2);
    }

    #[test]
    fn test_two_letter_elements() {
        let mol = parse_smiles("ClCBr").unwrap();
        assert_eq!(mol.atom(0).atomic_number, 17);
        assert_eq!(mol.atom(2).atomic_number, 35);

        let mol = parse_smiles("c1cc[se]c1").unwrap();
        assert_eq!(mol.atom(3).atomic_number, 34);
        assert!(mol.is_aromatic(3));
    }

    #[test]
    fn test_dot_disconnected_fragments() {
        let mol = parse_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 0);
    }

    #[test]
    fn test_ring_closure_bond_order() {
        let mol = parse_smiles("C=1CCCCC1").unwrap();
        let closure = mol.bond_between(0, 5).unwrap();
        assert_eq!(mol.bonds()[closure].order, BondOrder::Double);

        let mol = parse_smiles("C%12CCCCC%12").unwrap();
        assert_eq!(mol.rings().len(), 1);
    }

    #[test]
    fn test_whitespace_ends_smiles() {
        let mol = parse_smiles("CCO ethanol").unwrap();
        assert_eq!(mol.atom_count(), 3);
    }

    #[test]
    fn test_leading_whitespace_is_skipped() {
        let mol = parse_smiles(" CCO").unwrap();
        assert_eq!(mol.heavy_atom_count(), 3);

        let mol = parse_smiles("\t c1ccccc1 benzene").unwrap();
        assert_eq!(mol.heavy_atom_count(), 6);

        let err = parse_smiles("  C1CC").unwrap_err();
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_valence_limits() {
        assert_eq!(kind("C(C)(C)(C)(C)C"), ParseErrorKind::InvalidValence);
        assert_eq!(kind("[CH5]"), ParseErrorKind::InvalidValence);
        assert_eq!(kind("CC(=O)(=O)C"), ParseErrorKind::InvalidValence);
        assert_eq!(kind("FCl(C)"), ParseErrorKind::InvalidValence);

        assert!(parse_smiles("CC(C)(C)C").is_ok());
        assert!(parse_smiles("CN(=O)=O").is_ok());
        assert!(parse_smiles("CS(=O)(=O)C").is_ok());
        assert!(parse_smiles("[NH4+]").is_ok());
    }

    #[test]
    fn test_aromatic_atoms_need_an_aromatic_ring() {
        assert_eq!(kind("c"), ParseErrorKind::InvalidAromatic);
        assert_eq!(kind("cc"), ParseErrorKind::InvalidAromatic);
        assert_eq!(kind("c1cccc1"), ParseErrorKind::InvalidAromatic);

        assert!(parse_smiles("c1ccccc1").is_ok());
        assert!(parse_smiles("c1cc[nH]c1").is_ok());
        assert!(parse_smiles("c1ccncc1").is_ok());
        assert!(parse_smiles("c1ccc2ccccc2c1").is_ok());
    }

    #[test]
    fn test_empty_string_is_empty_molecule() {
        let mol = parse_smiles("").unwrap();
        assert_eq!(mol.atom_count(), 0);
        assert_eq!(mol.heavy_atom_count(), 0);
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(kind("not_a_smiles"), ParseErrorKind::UnexpectedCharacter('t'));
        assert_eq!(kind("C1CC"), ParseErrorKind::UnclosedRing(1));
        assert_eq!(kind("CC(C"), ParseErrorKind::UnbalancedParentheses);
        assert_eq!(kind("CC)C"), ParseErrorKind::UnbalancedParentheses);
        assert_eq!(kind("C()C"), ParseErrorKind::EmptyBranch);
        assert_eq!(kind("C=="), ParseErrorKind::DanglingBond);
        assert_eq!(kind("CC="), ParseErrorKind::DanglingBond);
        assert_eq!(kind("=CC"), ParseErrorKind::DanglingBond);
        assert_eq!(kind("1CC"), ParseErrorKind::RingClosureWithoutAtom);
        assert_eq!(kind("C11"), ParseErrorKind::InvalidRingClosure(1));
        assert_eq!(kind("C=1CCC#1"), ParseErrorKind::ConflictingRingBond(1));
        assert_eq!(kind("[C"), ParseErrorKind::UnterminatedBracket);
        assert_eq!(kind("[C?]"), ParseErrorKind::MalformedBracket);
        assert_eq!(kind("[Xx]"), ParseErrorKind::UnknownElement("X".into()));
        assert_eq!(kind("C$C"), ParseErrorKind::UnexpectedCharacter('$'));
    }

    #[test]
    fn test_error_position() {
        let err = parse_smiles("CC$").unwrap_err();
        assert_eq!(err.position, 2);
        let err = parse_smiles("C1CC").unwrap_err();
        assert_eq!(err.position, 4);
        let err = parse_smiles("CC(C)(C)(C)C").unwrap_err();
        assert_eq!(err.position, 1);
        let err = parse_smiles("CCc").unwrap_err();
        assert_eq!(err.position, 2);
    }
}
