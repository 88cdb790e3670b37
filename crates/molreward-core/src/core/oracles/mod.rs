//! # Scoring Oracles
//!
//! Each oracle maps one molecule descriptor (a SMILES string) to a reward in
//! `[0, 1]`. Oracles are pure once constructed: any expensive setup (reference
//! fingerprints, classifier artifacts) happens in the constructor so that a
//! single instance can serve an entire run.
//!
//! - [`similarity`] - Tanimoto similarity to a catalogued reference drug, capped at `k`
//! - [`property`] - logP acceptance window
//! - [`activity`] - bioactivity classifier over folded circular fingerprints
//! - [`reference`] - the catalog of named reference structures

pub mod activity;
pub mod property;
pub mod reference;
pub mod similarity;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Reference structure '{0}' is not in the catalog")]
    UnknownReference(String),

    #[error("Reference structure '{name}' could not be parsed: {reason}")]
    InvalidReference { name: String, reason: String },

    #[error("Failed to read classifier artifact '{path}': {source}", path = path.display())]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse classifier artifact '{path}': {source}", path = path.display())]
    ModelFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Classifier artifact '{path}' has {found} coefficients, expected {expected}", path = path.display())]
    ModelShape {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Classifier artifact '{path}' has a non-finite {parameter}", path = path.display())]
    NonFiniteParameter { path: PathBuf, parameter: String },

    #[error("Similarity ceiling k must lie in (0, 1], got {0}")]
    InvalidCeiling(f64),
}

/// A scoring function over molecule descriptors.
pub trait Oracle: Send + Sync {
    /// Registry name of the oracle.
    fn name(&self) -> &'static str;

    /// Scores one descriptor, or returns `None` when it cannot be parsed.
    fn try_score(&self, smiles: &str) -> Option<f64>;

    /// Scores one descriptor; unparsable input scores `0.0`.
    fn score(&self, smiles: &str) -> f64 {
        self.try_score(smiles).unwrap_or(0.0)
    }
}
