//! A SMILES reader covering the organic subset, bracket atoms, branches, ring
//! closures and disconnected components.

use super::molecule::{
    self, Atom, Bond, BondOrder, Molecule, BORON, BROMINE, CARBON, CHLORINE, FLUORINE, IODINE,
    NITROGEN, OXYGEN, PHOSPHORUS, SULFUR,
};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },
    #[error("Unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },
    #[error("Unterminated bracket atom starting at position {pos}")]
    UnterminatedBracket { pos: usize },
    #[error("Unbalanced branch at position {pos}")]
    UnbalancedBranch { pos: usize },
    #[error("Empty branch at position {pos}")]
    EmptyBranch { pos: usize },
    #[error("Bond symbol at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },
    #[error("Ring closure {label} was never closed")]
    UnclosedRing { label: u16 },
    #[error("Ring closure {label} at position {pos} is invalid: {reason}")]
    InvalidRingClosure {
        label: u16,
        pos: usize,
        reason: &'static str,
    },
    #[error("Atom {atom} exceeds the allowed valence of its element")]
    ValenceExceeded { atom: usize },
    #[error("Atom {atom} is marked aromatic but is not in a ring")]
    NonRingAromatic { atom: usize },
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
}

#[derive(Debug, Clone, Copy)]
struct BranchFrame {
    anchor: usize,
    atoms_at_open: usize,
    pos: usize,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    previous: Option<usize>,
    pending_bond: Option<(BondOrder, usize)>,
    branches: Vec<BranchFrame>,
    rings: HashMap<u16, RingOpening>,
}

/// Parses a SMILES string into a [`Molecule`], assigning implicit hydrogens.
pub fn parse(smiles: &str) -> Result<Molecule, SmilesError> {
    if let Some((pos, ch)) = smiles.char_indices().find(|(_, ch)| !ch.is_ascii()) {
        return Err(SmilesError::UnexpectedCharacter { ch, pos });
    }
    if smiles.trim().is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut parser = Parser {
        input: smiles.as_bytes(),
        pos: 0,
        atoms: Vec::new(),
        bonds: Vec::new(),
        previous: None,
        pending_bond: None,
        branches: Vec::new(),
        rings: HashMap::new(),
    };
    parser.run()?;
    parser.finish()
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn run(&mut self) -> Result<(), SmilesError> {
        while let Some(byte) = self.peek() {
            let start = self.pos;
            match byte {
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => {
                    if self.pending_bond.is_some() || self.previous.is_none() {
                        return Err(SmilesError::UnexpectedCharacter {
                            ch: byte as char,
                            pos: start,
                        });
                    }
                    let order = match byte {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b'$' => BondOrder::Quadruple,
                        b':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    self.pending_bond = Some((order, start));
                    self.pos += 1;
                }
                b'(' => {
                    let anchor = match (self.previous, self.pending_bond) {
                        (Some(anchor), None) => anchor,
                        _ => return Err(SmilesError::UnbalancedBranch { pos: start }),
                    };
                    self.branches.push(BranchFrame {
                        anchor,
                        atoms_at_open: self.atoms.len(),
                        pos: start,
                    });
                    self.pos += 1;
                }
                b')' => {
                    let frame = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnbalancedBranch { pos: start })?;
                    if let Some((_, pos)) = self.pending_bond {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    if self.atoms.len() == frame.atoms_at_open {
                        return Err(SmilesError::EmptyBranch { pos: frame.pos });
                    }
                    self.previous = Some(frame.anchor);
                    self.pos += 1;
                }
                b'.' => {
                    if let Some((_, pos)) = self.pending_bond {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    if self.previous.is_none() || !self.branches.is_empty() {
                        return Err(SmilesError::UnexpectedCharacter { ch: '.', pos: start });
                    }
                    self.previous = None;
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring_closure((byte - b'0') as u16, start)?;
                }
                b'%' => {
                    let digits = self.input.get(self.pos + 1..self.pos + 3);
                    let label = match digits {
                        Some([a, b]) if a.is_ascii_digit() && b.is_ascii_digit() => {
                            ((a - b'0') * 10 + (b - b'0')) as u16
                        }
                        _ => return Err(SmilesError::UnexpectedCharacter { ch: '%', pos: start }),
                    };
                    self.pos += 3;
                    self.ring_closure(label, start)?;
                }
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.add_atom(atom);
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.add_atom(atom);
                }
            }
        }
        Ok(())
    }

    fn add_atom(&mut self, atom: Atom) {
        let idx = self.atoms.len();
        let aromatic = atom.aromatic;
        self.atoms.push(atom);
        if let Some(prev) = self.previous {
            let order = match self.pending_bond.take() {
                Some((order, _)) => order,
                None => default_order(self.atoms[prev].aromatic, aromatic),
            };
            self.bonds.push(Bond {
                begin: prev,
                end: idx,
                order,
            });
        }
        self.previous = Some(idx);
    }

    fn ring_closure(&mut self, label: u16, pos: usize) -> Result<(), SmilesError> {
        let current = self.previous.ok_or(SmilesError::InvalidRingClosure {
            label,
            pos,
            reason: "no preceding atom",
        })?;
        let explicit = self.pending_bond.take().map(|(order, _)| order);

        match self.rings.remove(&label) {
            None => {
                self.rings.insert(
                    label,
                    RingOpening {
                        atom: current,
                        order: explicit,
                    },
                );
            }
            Some(opening) => {
                if opening.atom == current {
                    return Err(SmilesError::InvalidRingClosure {
                        label,
                        pos,
                        reason: "atom bonded to itself",
                    });
                }
                let duplicate = self.bonds.iter().any(|b| {
                    (b.begin == opening.atom && b.end == current)
                        || (b.begin == current && b.end == opening.atom)
                });
                if duplicate {
                    return Err(SmilesError::InvalidRingClosure {
                        label,
                        pos,
                        reason: "duplicate bond",
                    });
                }
                let order = match (opening.order, explicit) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::InvalidRingClosure {
                            label,
                            pos,
                            reason: "conflicting bond orders",
                        });
                    }
                    (Some(order), _) | (None, Some(order)) => order,
                    (None, None) => default_order(
                        self.atoms[opening.atom].aromatic,
                        self.atoms[current].aromatic,
                    ),
                };
                self.bonds.push(Bond {
                    begin: opening.atom,
                    end: current,
                    order,
                });
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let byte = self.input[start];
        let next = self.input.get(start + 1).copied();
        let (atomic_number, aromatic, width) = match (byte, next) {
            (b'C', Some(b'l')) => (CHLORINE, false, 2),
            (b'B', Some(b'r')) => (BROMINE, false, 2),
            (b'B', _) => (BORON, false, 1),
            (b'C', _) => (CARBON, false, 1),
            (b'N', _) => (NITROGEN, false, 1),
            (b'O', _) => (OXYGEN, false, 1),
            (b'P', _) => (PHOSPHORUS, false, 1),
            (b'S', _) => (SULFUR, false, 1),
            (b'F', _) => (FLUORINE, false, 1),
            (b'I', _) => (IODINE, false, 1),
            (b'b', _) => (BORON, true, 1),
            (b'c', _) => (CARBON, true, 1),
            (b'n', _) => (NITROGEN, true, 1),
            (b'o', _) => (OXYGEN, true, 1),
            (b'p', _) => (PHOSPHORUS, true, 1),
            (b's', _) => (SULFUR, true, 1),
            (b'*', _) => (0, false, 1),
            _ => {
                return Err(SmilesError::UnexpectedCharacter {
                    ch: byte as char,
                    pos: start,
                });
            }
        };
        self.pos += width;
        Ok(Atom {
            atomic_number,
            aromatic,
            charge: 0,
            isotope: None,
            bracket_hydrogens: None,
            implicit_hydrogens: 0,
        })
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let open = self.pos;
        let close = self.input[open..]
            .iter()
            .position(|&b| b == b']')
            .map(|offset| open + offset)
            .ok_or(SmilesError::UnterminatedBracket { pos: open })?;
        let body = &self.input[open + 1..close];
        let mut cursor = 0;

        let isotope_digits = body.iter().take_while(|b| b.is_ascii_digit()).count();
        let isotope = if isotope_digits > 0 {
            let text = std::str::from_utf8(&body[..isotope_digits]).unwrap_or_default();
            cursor = isotope_digits;
            text.parse::<u16>().ok()
        } else {
            None
        };

        let symbol_start = open + 1 + cursor;
        let (atomic_number, aromatic) = match body.get(cursor).copied() {
            Some(b'*') => {
                cursor += 1;
                (0, false)
            }
            Some(first) if first.is_ascii_alphabetic() => {
                let second = body.get(cursor + 1).copied().filter(u8::is_ascii_lowercase);
                let resolved = two_letter_symbol(first, second).or_else(|| one_letter_symbol(first));
                match resolved {
                    Some((number, aromatic, width)) => {
                        cursor += width;
                        (number, aromatic)
                    }
                    None => {
                        return Err(SmilesError::UnknownElement {
                            symbol: (first as char).to_string(),
                            pos: symbol_start,
                        });
                    }
                }
            }
            _ => return Err(SmilesError::UnterminatedBracket { pos: open }),
        };

        // Chirality marks carry no information used downstream.
        while let Some(b) = body.get(cursor).copied() {
            if b == b'@' {
                cursor += 1;
                while body
                    .get(cursor)
                    .is_some_and(|&c| matches!(c, b'T' | b'A' | b'L' | b'P' | b'B' | b'O' | b'0'..=b'9'))
                {
                    cursor += 1;
                }
            } else {
                break;
            }
        }

        let mut hydrogens = 0u8;
        if body.get(cursor) == Some(&b'H') {
            cursor += 1;
            hydrogens = 1;
            if let Some(d) = body.get(cursor).filter(|d| d.is_ascii_digit()) {
                hydrogens = d - b'0';
                cursor += 1;
            }
        }

        let mut charge = 0i8;
        if let Some(&sign) = body.get(cursor).filter(|b| **b == b'+' || **b == b'-') {
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            cursor += 1;
            if let Some(d) = body.get(cursor).filter(|d| d.is_ascii_digit()) {
                charge = unit * (d - b'0') as i8;
                cursor += 1;
            } else {
                charge = unit;
                while body.get(cursor) == Some(&sign) {
                    charge += unit;
                    cursor += 1;
                }
            }
        }

        if body.get(cursor) == Some(&b':') {
            cursor += 1;
            let digits = body[cursor..].iter().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 {
                return Err(SmilesError::UnexpectedCharacter {
                    ch: ':',
                    pos: open + cursor,
                });
            }
            cursor += digits;
        }

        if cursor != body.len() {
            return Err(SmilesError::UnexpectedCharacter {
                ch: body[cursor] as char,
                pos: open + 1 + cursor,
            });
        }

        self.pos = close + 1;
        Ok(Atom {
            atomic_number,
            aromatic,
            charge,
            isotope,
            bracket_hydrogens: Some(hydrogens),
            implicit_hydrogens: 0,
        })
    }

    fn finish(self) -> Result<Molecule, SmilesError> {
        if let Some(frame) = self.branches.last() {
            return Err(SmilesError::UnbalancedBranch { pos: frame.pos });
        }
        if let Some((_, pos)) = self.pending_bond {
            return Err(SmilesError::DanglingBond { pos });
        }
        if let Some(label) = self.rings.keys().min() {
            return Err(SmilesError::UnclosedRing { label: *label });
        }
        if self.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }

        let mut molecule = Molecule::from_parts(self.atoms, self.bonds);
        assign_implicit_hydrogens(&mut molecule)?;
        Ok(molecule)
    }
}

fn default_order(a_aromatic: bool, b_aromatic: bool) -> BondOrder {
    if a_aromatic && b_aromatic {
        BondOrder::Aromatic
    } else {
        BondOrder::Single
    }
}

fn one_letter_symbol(first: u8) -> Option<(u8, bool, usize)> {
    if first.is_ascii_lowercase() {
        let number = match first {
            b'b' => BORON,
            b'c' => CARBON,
            b'n' => NITROGEN,
            b'o' => OXYGEN,
            b'p' => PHOSPHORUS,
            b's' => SULFUR,
            _ => return None,
        };
        return Some((number, true, 1));
    }
    let symbol = [first];
    let symbol = std::str::from_utf8(&symbol).ok()?;
    molecule::atomic_number(symbol).map(|n| (n, false, 1))
}

fn two_letter_symbol(first: u8, second: Option<u8>) -> Option<(u8, bool, usize)> {
    let second = second?;
    match (first, second) {
        (b's', b'e') => return Some((34, true, 2)),
        (b'a', b's') => return Some((33, true, 2)),
        _ => {}
    }
    if !first.is_ascii_uppercase() {
        return None;
    }
    let symbol = [first, second];
    let symbol = std::str::from_utf8(&symbol).ok()?;
    molecule::atomic_number(symbol).map(|n| (n, false, 2))
}

fn default_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        BORON => &[3],
        CARBON => &[4],
        NITROGEN => &[3, 5],
        OXYGEN => &[2],
        PHOSPHORUS => &[3, 5],
        SULFUR => &[2, 4, 6],
        FLUORINE | CHLORINE | BROMINE | IODINE => &[1],
        _ => &[],
    }
}

fn assign_implicit_hydrogens(molecule: &mut Molecule) -> Result<(), SmilesError> {
    let mut counts = Vec::with_capacity(molecule.num_atoms());
    for (idx, atom) in molecule.atoms().iter().enumerate() {
        if atom.aromatic && !molecule.is_ring_atom(idx) {
            return Err(SmilesError::NonRingAromatic { atom: idx });
        }
        if atom.is_bracket() {
            counts.push(0);
            continue;
        }
        let valences = default_valences(atom.atomic_number);
        let Some(&max_valence) = valences.last() else {
            counts.push(0);
            continue;
        };
        let used = molecule.bond_valence_sum(idx);
        if used > max_valence {
            return Err(SmilesError::ValenceExceeded { atom: idx });
        }
        let hydrogens = if atom.aromatic {
            let surplus = u8::from(matches!(
                atom.atomic_number,
                BORON | CARBON | NITROGEN | PHOSPHORUS
            ));
            valences[0].saturating_sub(used + surplus)
        } else {
            valences
                .iter()
                .find(|&&v| v >= used)
                .map(|&v| v - used)
                .unwrap_or(0)
        };
        counts.push(hydrogens);
    }
    for (atom, hydrogens) in molecule.atoms_mut().iter_mut().zip(counts) {
        atom.implicit_hydrogens = hydrogens;
    }
    Ok(())
}
