//! The classifier seen from the serving side: an opaque `predict` over a
//! fixed-order feature vector.

use crate::error::{PreprocessingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A trained binary classifier.
///
/// Implementations must be safe to share across threads without locking:
/// inference is a pure read of the loaded model.
pub trait Predictor: Send + Sync {
    /// Predict the class (0 or 1) of one ordered feature vector.
    fn predict(&self, features: &[f64]) -> Result<u8>;

    /// Feature names in the order the model expects, when the artifact
    /// records them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

/// Always returns the same class. Useful as a stand-in model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantPredictor {
    label: u8,
}

impl ConstantPredictor {
    pub fn new(label: u8) -> Self {
        Self { label }
    }
}

impl Predictor for ConstantPredictor {
    fn predict(&self, _features: &[f64]) -> Result<u8> {
        Ok(self.label)
    }
}

/// Logistic regression weights exported from a training run.
///
/// Predicts 1 when `sigmoid(w·x + b) >= threshold`; the threshold is the
/// value picked by [`crate::threshold::find_best_threshold`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    /// Load a model from JSON and check that it is internally consistent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading logistic model from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let model: LogisticModel = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != self.feature_names.len() {
            return Err(PreprocessingError::LengthMismatch {
                expected: self.feature_names.len(),
                found: self.weights.len(),
            });
        }
        Ok(())
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(PreprocessingError::LengthMismatch {
                expected: self.weights.len(),
                found: features.len(),
            });
        }
        let logit: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

impl Predictor for LogisticModel {
    fn predict(&self, features: &[f64]) -> Result<u8> {
        Ok(u8::from(self.predict_proba(features)? >= self.threshold))
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }
}
