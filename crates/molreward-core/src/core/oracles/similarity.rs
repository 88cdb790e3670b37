use super::{Oracle, OracleError, reference};
use crate::core::chem::fingerprint::{self, CountFingerprint};
use crate::core::chem::smiles;

pub const DEFAULT_K: f64 = 0.7;
const RADIUS: u32 = 2;

/// Rewards structural similarity to a reference compound.
///
/// The raw Tanimoto coefficient is capped at `k` and divided by `k`, so every
/// molecule at least `k`-similar to the reference saturates at `1.0`.
#[derive(Debug, Clone)]
pub struct TanimotoOracle {
    k: f64,
    reference_name: String,
    reference_fp: CountFingerprint,
}

impl TanimotoOracle {
    pub fn new(k: f64, reference_name: &str) -> Result<Self, OracleError> {
        if !(k > 0.0 && k <= 1.0) {
            return Err(OracleError::InvalidCeiling(k));
        }
        let reference_smiles = reference::lookup(reference_name)
            .ok_or_else(|| OracleError::UnknownReference(reference_name.to_string()))?;
        let reference_mol =
            smiles::parse(reference_smiles).map_err(|e| OracleError::InvalidReference {
                name: reference_name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            k,
            reference_name: reference_name.to_string(),
            reference_fp: fingerprint::morgan_feature_counts(&reference_mol, RADIUS),
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    /// Raw Tanimoto similarity to the reference, before capping.
    pub fn similarity(&self, smiles_str: &str) -> Option<f64> {
        let mol = smiles::parse(smiles_str).ok()?;
        let fp = fingerprint::morgan_feature_counts(&mol, RADIUS);
        Some(fingerprint::tanimoto(&self.reference_fp, &fp))
    }

    /// Maps a raw similarity onto the reward scale.
    pub fn rescale(&self, similarity: f64) -> f64 {
        similarity.min(self.k) / self.k
    }
}

impl Oracle for TanimotoOracle {
    fn name(&self) -> &'static str {
        "tanimoto"
    }

    fn try_score(&self, smiles_str: &str) -> Option<f64> {
        self.similarity(smiles_str).map(|sim| self.rescale(sim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELEBREX: &str = "C1(S(N)(=O)=O)=CC=C(N2C(C3=CC=C(C)C=C3)=CC(C(F)(F)F)=N2)C=C1";

    #[test]
    fn reference_itself_has_unit_similarity_and_saturates() {
        let oracle = TanimotoOracle::new(DEFAULT_K, "Celebrex").unwrap();
        assert_eq!(oracle.similarity(CELEBREX), Some(1.0));
        assert_eq!(oracle.score(CELEBREX), 1.0);
    }

    #[test]
    fn identical_molecule_scores_min_one_k_over_k_for_any_k() {
        for k in [0.3, 0.7, 1.0] {
            let oracle = TanimotoOracle::new(k, "Celebrex").unwrap();
            assert_eq!(oracle.score(CELEBREX), 1.0_f64.min(k) / k);
        }
    }

    #[test]
    fn rescale_is_monotonic_and_capped() {
        let oracle = TanimotoOracle::new(0.5, "Celebrex").unwrap();
        let samples = [0.0, 0.1, 0.25, 0.49, 0.5, 0.8, 1.0];
        let scores: Vec<f64> = samples.iter().map(|&s| oracle.rescale(s)).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(oracle.rescale(0.25), 0.5);
        assert_eq!(oracle.rescale(0.5), 1.0);
        assert_eq!(oracle.rescale(0.8), 1.0);
    }

    #[test]
    fn dissimilar_molecule_scores_below_one() {
        let oracle = TanimotoOracle::new(DEFAULT_K, "Celebrex").unwrap();
        let score = oracle.score("CCO");
        assert!((0.0..1.0).contains(&score));
    }

    #[test]
    fn unparsable_input_scores_zero() {
        let oracle = TanimotoOracle::new(DEFAULT_K, "Celebrex").unwrap();
        assert_eq!(oracle.try_score("C1CC"), None);
        assert_eq!(oracle.score(""), 0.0);
        assert_eq!(oracle.score("not a smiles"), 0.0);
    }

    #[test]
    fn ceiling_outside_unit_interval_is_rejected() {
        for k in [0.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    TanimotoOracle::new(k, "Celebrex"),
                    Err(OracleError::InvalidCeiling(_))
                ),
                "k = {k} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_reference_is_rejected() {
        assert!(matches!(
            TanimotoOracle::new(DEFAULT_K, "Aspirin"),
            Err(OracleError::UnknownReference(_))
        ));
    }
}
