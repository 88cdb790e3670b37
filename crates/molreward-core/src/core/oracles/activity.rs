use super::{Oracle, OracleError};
use crate::core::chem::fingerprint::{self, FOLDED_SIZE};
use crate::core::chem::smiles;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CLASSIFIER_PATH: &str = "data/clf.toml";
const RADIUS: u32 = 3;

/// A pre-trained binary classifier over folded count fingerprints.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClassifierModel {
    LogisticRegression {
        intercept: f64,
        coefficients: Vec<f64>,
    },
}

impl ClassifierModel {
    pub fn load(path: &Path) -> Result<Self, OracleError> {
        let content = std::fs::read_to_string(path).map_err(|e| OracleError::ModelIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model: ClassifierModel =
            toml::from_str(&content).map_err(|e| OracleError::ModelFormat {
                path: path.to_path_buf(),
                source: e,
            })?;
        let found = model.width();
        if found != FOLDED_SIZE {
            return Err(OracleError::ModelShape {
                path: path.to_path_buf(),
                expected: FOLDED_SIZE,
                found,
            });
        }
        if let Some(parameter) = model.first_non_finite() {
            return Err(OracleError::NonFiniteParameter {
                path: path.to_path_buf(),
                parameter,
            });
        }
        Ok(model)
    }

    fn first_non_finite(&self) -> Option<String> {
        match self {
            ClassifierModel::LogisticRegression {
                intercept,
                coefficients,
            } => {
                if !intercept.is_finite() {
                    return Some("intercept".to_string());
                }
                coefficients
                    .iter()
                    .position(|c| !c.is_finite())
                    .map(|idx| format!("coefficient at index {idx}"))
            }
        }
    }

    pub fn width(&self) -> usize {
        match self {
            ClassifierModel::LogisticRegression { coefficients, .. } => coefficients.len(),
        }
    }

    /// Probability of the positive (active) class. An undefined logit (for example
    /// `inf - inf` from an in-memory model) yields `0.0`.
    pub fn predict_proba(&self, features: &[u32]) -> f64 {
        match self {
            ClassifierModel::LogisticRegression {
                intercept,
                coefficients,
            } => {
                let logit = coefficients
                    .iter()
                    .zip(features)
                    .filter(|&(_, &x)| x != 0)
                    .fold(*intercept, |acc, (w, &x)| acc + w * x as f64);
                if logit.is_nan() {
                    return 0.0;
                }
                1.0 / (1.0 + (-logit).exp())
            }
        }
    }
}

/// Scores molecules by predicted bioactivity.
#[derive(Debug, Clone)]
pub struct ActivityOracle {
    model: ClassifierModel,
    model_path: PathBuf,
}

impl ActivityOracle {
    pub fn load(path: &Path) -> Result<Self, OracleError> {
        Ok(Self {
            model: ClassifierModel::load(path)?,
            model_path: path.to_path_buf(),
        })
    }

    pub fn from_model(model: ClassifierModel) -> Self {
        Self {
            model,
            model_path: PathBuf::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Radius-3 feature-invariant counts folded into `FOLDED_SIZE` buckets.
    pub fn features(smiles_str: &str) -> Option<Vec<u32>> {
        let mol = smiles::parse(smiles_str).ok()?;
        Some(fingerprint::morgan_feature_counts(&mol, RADIUS).fold())
    }
}

impl Oracle for ActivityOracle {
    fn name(&self) -> &'static str {
        "activity_model"
    }

    fn try_score(&self, smiles_str: &str) -> Option<f64> {
        Self::features(smiles_str).map(|features| self.model.predict_proba(&features))
    }
}
