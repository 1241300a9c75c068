//! Ridge regression with an unpenalized intercept.

use crate::error::{ModelError, Result};
use log::info;

const MODEL: &str = "ridge";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeConfig {
    /// L2 penalty on the slope coefficients
    pub alpha: f64,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RidgeModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl RidgeModel {
    /// Fit on the rows of `x` against `y`.
    ///
    /// Columns and target are centered first so the intercept is not
    /// shrunk; the penalized normal equations are then solved by Cholesky
    /// decomposition.
    pub fn fit(config: &RidgeConfig, x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        if config.alpha.is_nan() || config.alpha < 0.0 {
            return Err(ModelError::Input(format!(
                "ridge alpha must be non-negative, got {}",
                config.alpha
            )));
        }
        if x.len() != y.len() {
            return Err(ModelError::Input(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(ModelError::fit(MODEL, "no complete training rows"));
        }
        let n = x.len() as f64;
        let width = x[0].len();
        if x.iter().any(|row| row.len() != width) {
            return Err(ModelError::Input("feature rows differ in length".to_string()));
        }

        let x_mean: Vec<f64> = (0..width)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n;

        let mut gram = vec![vec![0.0; width]; width];
        let mut moment = vec![0.0; width];
        for (row, target) in x.iter().zip(y) {
            let centered: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let yc = target - y_mean;
            for i in 0..width {
                moment[i] += centered[i] * yc;
                for j in 0..=i {
                    gram[i][j] += centered[i] * centered[j];
                }
            }
        }
        for i in 0..width {
            gram[i][i] += config.alpha;
            for j in 0..i {
                gram[j][i] = gram[i][j];
            }
        }

        let coefficients = solve_cholesky(&gram, &moment)
            .ok_or_else(|| ModelError::fit(MODEL, "normal equations are singular"))?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::fit(MODEL, "non-finite coefficients"));
        }
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        info!(
            "Fitted ridge (alpha {}) on {} rows x {} features",
            config.alpha,
            x.len(),
            width
        );
        Ok(RidgeModel {
            intercept,
            coefficients,
        })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

/// Solve `a x = b` for symmetric positive definite `a`; `None` when `a` is
/// not positive definite.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][i] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        z[i] = (b[i] - (0..i).map(|k| l[i][k] * z[k]).sum::<f64>()) / l[i][i];
    }
    // L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = (z[i] - (i + 1..n).map(|k| l[k][i] * x[k]).sum::<f64>()) / l[i][i];
    }
    Some(x)
}
