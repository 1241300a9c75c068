use crate::error::{ModelError, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Error summary over the scored pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub mae: f64,
    pub rmse: f64,
    /// Pairs with both sides present
    pub scored: usize,
    /// Pairs dropped because either side was missing
    pub skipped: usize,
}

/// Mean absolute and root mean squared error of `predicted` against `actual`.
///
/// Pairs with a missing side are skipped and counted. Inputs of different
/// length, or with no complete pair, are rejected.
pub fn evaluate(actual: &[Option<f64>], predicted: &[Option<f64>]) -> Result<Metrics> {
    if actual.len() != predicted.len() {
        return Err(ModelError::Input(format!(
            "{} actual values but {} predictions",
            actual.len(),
            predicted.len()
        )));
    }
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter_map(|(a, p)| Some((*a)? - (*p)?))
        .collect();
    let skipped = actual.len() - errors.len();
    if errors.is_empty() {
        return Err(ModelError::Input(format!(
            "no complete actual/prediction pairs among {} dates",
            actual.len()
        )));
    }
    if skipped > 0 {
        warn!(
            "Skipped {} of {} dates with a missing actual or prediction",
            skipped,
            actual.len()
        );
    }

    let n = errors.len() as f64;
    Ok(Metrics {
        mae: errors.iter().map(|e| e.abs()).sum::<f64>() / n,
        rmse: (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt(),
        scored: errors.len(),
        skipped,
    })
}

/// One line of the metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub model: String,
    pub mae: f64,
    pub rmse: f64,
}

impl MetricsRecord {
    pub fn new(model: impl Into<String>, metrics: &Metrics) -> Self {
        MetricsRecord {
            model: model.into(),
            mae: metrics.mae,
            rmse: metrics.rmse,
        }
    }
}
