//! Decision threshold search over predicted probabilities.

use crate::error::{PreprocessingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// First candidate threshold.
pub const THRESHOLD_START: f64 = 0.10;
/// Spacing between candidates.
pub const THRESHOLD_STEP: f64 = 0.01;
/// Number of candidates, covering [0.10, 1.00).
pub const THRESHOLD_CANDIDATES: usize = 90;

/// Best threshold found and the metric value it achieved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearch {
    pub threshold: f64,
    pub score: f64,
}

/// Stock binary classification metrics. Zero denominators score 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMetric {
    #[default]
    F1,
    Precision,
    Recall,
    Accuracy,
}

impl ClassificationMetric {
    /// Score `y_pred` against `y_true`. Both slices hold 0/1 labels.
    pub fn score(self, y_true: &[u8], y_pred: &[u8]) -> f64 {
        let counts = ConfusionCounts::from_labels(y_true, y_pred);
        match self {
            ClassificationMetric::F1 => counts.f1(),
            ClassificationMetric::Precision => counts.precision(),
            ClassificationMetric::Recall => counts.recall(),
            ClassificationMetric::Accuracy => counts.accuracy(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationMetric::F1 => "f1",
            ClassificationMetric::Precision => "precision",
            ClassificationMetric::Recall => "recall",
            ClassificationMetric::Accuracy => "accuracy",
        }
    }
}

impl fmt::Display for ClassificationMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassificationMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f1" => Ok(ClassificationMetric::F1),
            "precision" => Ok(ClassificationMetric::Precision),
            "recall" => Ok(ClassificationMetric::Recall),
            "accuracy" => Ok(ClassificationMetric::Accuracy),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

/// Positive class is 1; any non-zero label counts as positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ConfusionCounts {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

impl ConfusionCounts {
    fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut counts = ConfusionCounts::default();
        for (&actual, &predicted) in y_true.iter().zip(y_pred) {
            match (actual != 0, predicted != 0) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        counts
    }

    fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    fn f1(&self) -> f64 {
        // 2TP / (2TP + FP + FN), equal to the harmonic mean of precision and recall
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }

    fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.tp + self.tn + self.fp + self.fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Candidate thresholds in scan order.
pub fn candidate_thresholds() -> impl Iterator<Item = f64> {
    (0..THRESHOLD_CANDIDATES).map(|i| THRESHOLD_START + i as f64 * THRESHOLD_STEP)
}

/// Find the threshold in [0.10, 1.00) that maximizes `metric`.
///
/// Predictions are `prob >= threshold`. Only a strictly higher score replaces
/// the current best, so the earliest threshold wins a tie. The search starts
/// from threshold 0.5 with score -1, so a value is always returned.
pub fn find_best_threshold<M>(y_true: &[u8], y_prob: &[f64], metric: M) -> Result<ThresholdSearch>
where
    M: Fn(&[u8], &[u8]) -> f64,
{
    if y_true.len() != y_prob.len() {
        return Err(PreprocessingError::LengthMismatch {
            expected: y_true.len(),
            found: y_prob.len(),
        });
    }

    let mut best = ThresholdSearch {
        threshold: 0.5,
        score: -1.0,
    };
    let mut y_pred = vec![0u8; y_prob.len()];

    for threshold in candidate_thresholds() {
        for (pred, &prob) in y_pred.iter_mut().zip(y_prob) {
            *pred = u8::from(prob >= threshold);
        }
        let score = metric(y_true, &y_pred);
        if score > best.score {
            best = ThresholdSearch { threshold, score };
        }
    }

    debug!(
        "Best threshold {:.2} with score {:.4}",
        best.threshold, best.score
    );
    Ok(best)
}

/// [`find_best_threshold`] with the default F1 metric.
pub fn find_best_f1_threshold(y_true: &[u8], y_prob: &[f64]) -> Result<ThresholdSearch> {
    find_best_threshold(y_true, y_prob, |t, p| ClassificationMetric::F1.score(t, p))
}
