use phf::phf_map;

static ATOMIC_NUMBERS: phf::Map<&'static str, u8> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15,
    "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22,
    "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29,
    "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36,
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50,
    "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54, "Cs" => 55, "Ba" => 56, "La" => 57,
    "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78,
    "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85,
    "Rn" => 86,
};

/// Looks up the atomic number of an element symbol (case-sensitive, e.g. `"Cl"`).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ATOMIC_NUMBERS.get(symbol).copied()
}

pub const HYDROGEN: u8 = 1;
pub const BORON: u8 = 5;
pub const CARBON: u8 = 6;
pub const NITROGEN: u8 = 7;
pub const OXYGEN: u8 = 8;
pub const FLUORINE: u8 = 9;
pub const PHOSPHORUS: u8 = 15;
pub const SULFUR: u8 = 16;
pub const CHLORINE: u8 = 17;
pub const BROMINE: u8 = 35;
pub const IODINE: u8 = 53;

pub fn is_halogen(atomic_number: u8) -> bool {
    matches!(atomic_number, FLUORINE | CHLORINE | BROMINE | IODINE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution of the bond to an atom's explicit valence. Aromatic bonds count
    /// as single bonds; the aromatic surplus is accounted for per atom.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    pub(crate) fn code(self) -> u32 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Aromatic => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub atomic_number: u8,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Hydrogen count written inside a bracket atom; `None` for organic-subset atoms.
    pub bracket_hydrogens: Option<u8>,
    pub implicit_hydrogens: u8,
}

impl Atom {
    pub fn total_hydrogens(&self) -> u8 {
        self.bracket_hydrogens.unwrap_or(self.implicit_hydrogens)
    }

    pub fn is_bracket(&self) -> bool {
        self.bracket_hydrogens.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom { self.end } else { self.begin }
    }
}

/// A parsed molecular graph with hydrogens held as per-atom counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<usize>>,
    ring_bonds: Vec<bool>,
}

impl Molecule {
    pub(crate) fn from_parts(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (idx, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push(idx);
            adjacency[bond.end].push(idx);
        }
        let mut molecule = Self {
            atoms,
            bonds,
            adjacency,
            ring_bonds: Vec::new(),
        };
        molecule.ring_bonds = (0..molecule.bonds.len())
            .map(|idx| molecule.is_cycle_bond(idx))
            .collect();
        molecule
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Iterates `(neighbor_index, bond)` pairs for the given atom.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.adjacency[atom].iter().map(move |&bond_idx| {
            let bond = &self.bonds[bond_idx];
            (bond.other(atom), bond)
        })
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_valence_sum(&self, atom: usize) -> u8 {
        self.neighbors(atom).map(|(_, bond)| bond.order.valence()).sum()
    }

    pub fn is_ring_atom(&self, atom: usize) -> bool {
        self.adjacency[atom]
            .iter()
            .any(|&bond_idx| self.ring_bonds[bond_idx])
    }

    pub fn is_ring_bond(&self, bond_idx: usize) -> bool {
        self.ring_bonds[bond_idx]
    }

    pub fn has_bond_between(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).any(|(other, _)| other == b)
    }

    // A bond lies on a cycle iff its endpoints stay connected once it is removed.
    fn is_cycle_bond(&self, bond_idx: usize) -> bool {
        let bond = self.bonds[bond_idx];
        let mut visited = vec![false; self.atoms.len()];
        let mut stack = vec![bond.begin];
        visited[bond.begin] = true;
        while let Some(current) = stack.pop() {
            for &edge in &self.adjacency[current] {
                if edge == bond_idx {
                    continue;
                }
                let next = self.bonds[edge].other(current);
                if next == bond.end {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbon() -> Atom {
        Atom {
            atomic_number: CARBON,
            aromatic: false,
            charge: 0,
            isotope: None,
            bracket_hydrogens: None,
            implicit_hydrogens: 0,
        }
    }

    fn single(begin: usize, end: usize) -> Bond {
        Bond {
            begin,
            end,
            order: BondOrder::Single,
        }
    }

    #[test]
    fn atomic_number_resolves_one_and_two_letter_symbols() {
        assert_eq!(atomic_number("C"), Some(6));
        assert_eq!(atomic_number("Cl"), Some(17));
        assert_eq!(atomic_number("Xx"), None);
    }

    #[test]
    fn chain_bonds_are_not_ring_bonds() {
        let mol = Molecule::from_parts(vec![carbon(), carbon(), carbon()], vec![single(0, 1), single(1, 2)]);
        assert!(!mol.is_ring_bond(0));
        assert!(!mol.is_ring_atom(1));
    }

    #[test]
    fn triangle_bonds_are_ring_bonds_and_pendant_is_not() {
        let mol = Molecule::from_parts(
            vec![carbon(), carbon(), carbon(), carbon()],
            vec![single(0, 1), single(1, 2), single(2, 0), single(2, 3)],
        );
        assert!(mol.is_ring_bond(0));
        assert!(mol.is_ring_bond(2));
        assert!(!mol.is_ring_bond(3));
        assert!(mol.is_ring_atom(2));
        assert!(!mol.is_ring_atom(3));
    }

    #[test]
    fn neighbors_and_degree_follow_bonds() {
        let mol = Molecule::from_parts(vec![carbon(), carbon(), carbon()], vec![single(0, 1), single(1, 2)]);
        let mut neighbors: Vec<_> = mol.neighbors(1).map(|(n, _)| n).collect();
        neighbors.sort();
        assert_eq!(neighbors, vec![0, 2]);
        assert_eq!(mol.degree(1), 2);
        assert_eq!(mol.bond_valence_sum(1), 2);
        assert!(mol.has_bond_between(0, 1));
        assert!(!mol.has_bond_between(0, 2));
    }
}
