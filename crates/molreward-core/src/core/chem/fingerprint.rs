use super::molecule::{self, Molecule, BondOrder, CARBON, NITROGEN, OXYGEN};
use std::collections::BTreeMap;

/// Width of folded feature vectors.
pub const FOLDED_SIZE: usize = 2048;

const FEATURE_DONOR: u32 = 1 << 0;
const FEATURE_ACCEPTOR: u32 = 1 << 1;
const FEATURE_AROMATIC: u32 = 1 << 2;
const FEATURE_HALOGEN: u32 = 1 << 3;
const FEATURE_BASIC: u32 = 1 << 4;
const FEATURE_ACIDIC: u32 = 1 << 5;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Sparse count fingerprint keyed by 32-bit environment identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountFingerprint {
    counts: BTreeMap<u32, u32>,
}

impl CountFingerprint {
    pub fn nonzero_elements(&self) -> &BTreeMap<u32, u32> {
        &self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    fn add(&mut self, id: u32) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Folds identifiers into a dense vector of `FOLDED_SIZE` buckets by modulo,
    /// summing colliding counts.
    pub fn fold(&self) -> Vec<u32> {
        let mut folded = vec![0u32; FOLDED_SIZE];
        for (&id, &count) in &self.counts {
            folded[id as usize % FOLDED_SIZE] += count;
        }
        folded
    }
}

/// Tanimoto coefficient on count vectors: `Σmin / (Σa + Σb − Σmin)`.
pub fn tanimoto(a: &CountFingerprint, b: &CountFingerprint) -> f64 {
    let mut shared = 0u64;
    for (id, &count_a) in &a.counts {
        if let Some(&count_b) = b.counts.get(id) {
            shared += count_a.min(count_b) as u64;
        }
    }
    let denominator = a.total() + b.total() - shared;
    if denominator == 0 {
        return 0.0;
    }
    shared as f64 / denominator as f64
}

/// Circular (Morgan) count fingerprint using pharmacophoric feature invariants.
pub fn morgan_feature_counts(mol: &Molecule, radius: u32) -> CountFingerprint {
    let mut fingerprint = CountFingerprint::default();
    let mut identifiers: Vec<u32> = (0..mol.num_atoms())
        .map(|idx| hash_words(&[feature_invariant(mol, idx)]))
        .collect();
    for &id in &identifiers {
        fingerprint.add(id);
    }

    for layer in 1..=radius {
        let next: Vec<u32> = (0..mol.num_atoms())
            .map(|idx| {
                let mut environment: Vec<(u32, u32)> = mol
                    .neighbors(idx)
                    .map(|(neighbor, bond)| (bond.order.code(), identifiers[neighbor]))
                    .collect();
                environment.sort_unstable();
                let mut words = Vec::with_capacity(2 + environment.len() * 2);
                words.push(layer);
                words.push(identifiers[idx]);
                for (bond_code, id) in environment {
                    words.push(bond_code);
                    words.push(id);
                }
                hash_words(&words)
            })
            .collect();
        for &id in &next {
            fingerprint.add(id);
        }
        identifiers = next;
    }
    fingerprint
}

fn feature_invariant(mol: &Molecule, idx: usize) -> u32 {
    let atom = mol.atom(idx);
    let hydrogens = atom.total_hydrogens();
    let mut features = 0;

    let is_n_or_o = matches!(atom.atomic_number, NITROGEN | OXYGEN);
    if is_n_or_o && hydrogens > 0 && atom.charge >= 0 {
        features |= FEATURE_DONOR;
    }
    if is_acceptor(mol, idx) {
        features |= FEATURE_ACCEPTOR;
    }
    if atom.aromatic {
        features |= FEATURE_AROMATIC;
    }
    if molecule::is_halogen(atom.atomic_number) {
        features |= FEATURE_HALOGEN;
    }
    if is_basic(mol, idx) {
        features |= FEATURE_BASIC;
    }
    if is_acidic(mol, idx) {
        features |= FEATURE_ACIDIC;
    }
    features
}

fn is_acceptor(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    match atom.atomic_number {
        OXYGEN => atom.charge <= 0,
        NITROGEN if atom.aromatic => atom.total_hydrogens() == 0 && mol.degree(idx) == 2,
        NITROGEN => mol
            .neighbors(idx)
            .any(|(_, bond)| bond.order == BondOrder::Triple),
        _ => false,
    }
}

fn is_basic(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    if atom.atomic_number != NITROGEN || atom.aromatic {
        return false;
    }
    if atom.charge > 0 {
        return true;
    }
    mol.neighbors(idx).all(|(neighbor, bond)| {
        let other = mol.atom(neighbor);
        bond.order == BondOrder::Single
            && other.atomic_number == CARBON
            && !other.aromatic
            && mol
                .neighbors(neighbor)
                .all(|(_, b)| b.order == BondOrder::Single)
    })
}

fn is_acidic(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    if atom.atomic_number != OXYGEN {
        return false;
    }
    if atom.charge < 0 {
        return true;
    }
    atom.total_hydrogens() > 0
        && mol.neighbors(idx).any(|(carbon, _)| {
            mol.atom(carbon).atomic_number == CARBON
                && mol.neighbors(carbon).any(|(other, bond)| {
                    bond.order == BondOrder::Double && mol.atom(other).atomic_number == OXYGEN
                })
        })
}

// FNV-1a over little-endian words, folded to 32 bits; stable across processes.
fn hash_words(words: &[u32]) -> u32 {
    let mut hash = FNV_OFFSET;
    for word in words {
        for byte in word.to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    ((hash >> 32) ^ hash) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;

    fn fp(smiles_str: &str, radius: u32) -> CountFingerprint {
        morgan_feature_counts(&smiles::parse(smiles_str).unwrap(), radius)
    }

    #[test]
    fn identical_molecules_have_unit_similarity() {
        let a = fp("CC(=O)Oc1ccccc1C(=O)O", 2);
        let b = fp("CC(=O)Oc1ccccc1C(=O)O", 2);
        assert_eq!(tanimoto(&a, &b), 1.0);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let a = fp("c1ccccc1O", 2);
        let b = fp("c1ccccc1N", 2);
        let ab = tanimoto(&a, &b);
        assert_eq!(ab, tanimoto(&b, &a));
        assert!(ab > 0.0 && ab < 1.0);
    }

    #[test]
    fn empty_fingerprints_have_zero_similarity() {
        let empty = CountFingerprint::default();
        assert_eq!(tanimoto(&empty, &empty), 0.0);
    }

    #[test]
    fn counts_grow_with_radius() {
        let mol = smiles::parse("CCCC").unwrap();
        let r0 = morgan_feature_counts(&mol, 0);
        let r2 = morgan_feature_counts(&mol, 2);
        assert_eq!(r0.total(), 4);
        assert_eq!(r2.total(), 12);
    }

    #[test]
    fn fingerprints_are_independent_of_atom_order() {
        assert_eq!(fp("OCC", 2), fp("CCO", 2));
    }

    #[test]
    fn folding_preserves_total_count() {
        let fingerprint = fp("CN1C=NC2=C1C(=O)N(C(=O)N2C)C", 3);
        let folded = fingerprint.fold();
        assert_eq!(folded.len(), FOLDED_SIZE);
        let folded_total: u64 = folded.iter().map(|&c| c as u64).sum();
        assert_eq!(folded_total, fingerprint.total());
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(hash_words(&[1, 2, 3]), hash_words(&[1, 2, 3]));
        assert_ne!(hash_words(&[1, 2, 3]), hash_words(&[3, 2, 1]));
    }
}
