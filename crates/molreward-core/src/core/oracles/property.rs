use super::Oracle;
use crate::core::chem::{descriptors, smiles};

pub const LOGP_MIN: f64 = 0.0;
pub const LOGP_MAX: f64 = 3.0;

/// Binary reward for molecules whose estimated logP falls in `[0, 3]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPOracle;

impl LogPOracle {
    pub fn new() -> Self {
        Self
    }

    pub fn logp(&self, smiles_str: &str) -> Option<f64> {
        smiles::parse(smiles_str)
            .ok()
            .map(|mol| descriptors::crippen_logp(&mol))
    }

    /// Acceptance decision for a computed logP; both bounds are inclusive.
    pub fn score_value(&self, logp: f64) -> f64 {
        if (LOGP_MIN..=LOGP_MAX).contains(&logp) {
            1.0
        } else {
            0.0
        }
    }
}

impl Oracle for LogPOracle {
    fn name(&self) -> &'static str {
        "logp"
    }

    fn try_score(&self, smiles_str: &str) -> Option<f64> {
        self.logp(smiles_str).map(|value| self.score_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_bounds_are_inclusive() {
        let oracle = LogPOracle::new();
        assert_eq!(oracle.score_value(0.0), 1.0);
        assert_eq!(oracle.score_value(3.0), 1.0);
        assert_eq!(oracle.score_value(1.5), 1.0);
    }

    #[test]
    fn values_just_outside_the_interval_score_zero() {
        let oracle = LogPOracle::new();
        assert_eq!(oracle.score_value(-1e-9), 0.0);
        assert_eq!(oracle.score_value(3.0 + 1e-9), 0.0);
        assert_eq!(oracle.score_value(f64::NAN), 0.0);
    }

    #[test]
    fn scores_molecules_by_estimated_logp() {
        let oracle = LogPOracle::new();
        assert_eq!(oracle.score("c1ccccc1"), 1.0);
        assert_eq!(oracle.score("CCO"), 0.0);
        assert_eq!(oracle.score("CCCCCCCCCCCC"), 0.0);
    }

    #[test]
    fn unparsable_input_scores_zero() {
        let oracle = LogPOracle::new();
        assert_eq!(oracle.try_score("C(("), None);
        assert_eq!(oracle.score(""), 0.0);
    }
}
