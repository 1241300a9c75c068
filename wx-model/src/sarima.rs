//! Seasonal ARIMA estimated by conditional sum of squares.
//!
//! The model is `phi(B) Phi(B^s) (1-B)^d (1-B^s)^D y_t = theta(B) Theta(B^s) e_t`
//! with no intercept. All polynomials are multiplied out into one
//! autoregressive and one moving-average polynomial on the undifferenced
//! series, so a single recursion produces residuals for fitting, skips
//! missing observations and integrates multi-step forecasts.

use crate::error::{ModelError, Result};
use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;
use log::{debug, info};

const MODEL: &str = "sarima";

/// Cost reported for coefficients whose recursion diverges.
const LARGE_COST: f64 = 1e12;

/// Orders and solver settings for [`SarimaModel::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarimaConfig {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
    /// Nelder-Mead iteration cap
    pub max_iters: u64,
    /// Offset of each initial simplex vertex from the origin
    pub initial_step: f64,
    /// Stop once the simplex costs have this standard deviation
    pub sd_tolerance: f64,
}

impl Default for SarimaConfig {
    /// (1,1,1) x (1,1,1,7)
    fn default() -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
            period: 7,
            max_iters: 500,
            initial_step: 0.1,
            sd_tolerance: 1e-10,
        }
    }
}

impl SarimaConfig {
    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    /// Expand `params` (laid out `[phi.., Phi.., theta.., Theta..]`) into the
    /// full autoregressive and moving-average polynomials in `B`, lowest power
    /// first, both with a leading 1.
    fn polynomials(&self, params: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let (phi, rest) = params.split_at(self.p);
        let (seasonal_phi, rest) = rest.split_at(self.seasonal_p);
        let (theta, seasonal_theta) = rest.split_at(self.q);

        let ar = multiply(
            &multiply(&lag_polynomial(phi, 1, -1.0), &lag_polynomial(seasonal_phi, self.period, -1.0)),
            &differencing_polynomial(self.d, self.seasonal_d, self.period),
        );
        let ma = multiply(
            &lag_polynomial(theta, 1, 1.0),
            &lag_polynomial(seasonal_theta, self.period, 1.0),
        );
        (ar, ma)
    }
}

/// Product of two polynomials given by their coefficients, lowest power first.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c_1 B^spacing + c_2 B^(2 spacing) + ...)`
fn lag_polynomial(coefficients: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

/// `(1 - B)^d (1 - B^period)^seasonal_d`
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    let mut seasonal = vec![0.0; period + 1];
    seasonal[0] = 1.0;
    seasonal[period] = -1.0;
    for _ in 0..seasonal_d {
        poly = multiply(&poly, &seasonal);
    }
    poly
}

/// Output of one pass of the prediction recursion.
struct Recursion {
    /// Observed values where present, one-step predictions elsewhere,
    /// followed by the forecast steps
    path: Vec<f64>,
    sum_of_squares: f64,
    residual_count: usize,
}

/// Run the one-step recursion over `values` and `horizon` further steps.
///
/// The first `ar.len() - 1` values condition the recursion and carry zero
/// residuals. A missing value, and every step past the end, takes its
/// prediction with a zero residual. `values[0]` must be present.
fn recurse(ar: &[f64], ma: &[f64], values: &[Option<f64>], horizon: usize) -> Recursion {
    let start = ar.len().saturating_sub(1);
    let total = values.len() + horizon;
    let mut path = Vec::with_capacity(total);
    let mut residuals = vec![0.0; total];
    let mut sum_of_squares = 0.0;
    let mut residual_count = 0;

    for t in 0..total {
        let observed = values.get(t).copied().flatten();
        if t < start {
            let carried = path.last().copied().unwrap_or(0.0);
            path.push(observed.unwrap_or(carried));
            continue;
        }
        let mut prediction = 0.0;
        for (k, c) in ar.iter().enumerate().skip(1) {
            prediction -= c * path[t - k];
        }
        for (k, c) in ma.iter().enumerate().skip(1) {
            if let Some(lagged) = t.checked_sub(k) {
                prediction += c * residuals[lagged];
            }
        }
        match observed {
            Some(value) => {
                let residual = value - prediction;
                residuals[t] = residual;
                sum_of_squares += residual * residual;
                residual_count += 1;
                path.push(value);
            }
            None => path.push(prediction),
        }
    }

    Recursion {
        path,
        sum_of_squares,
        residual_count,
    }
}

/// Mean squared one-step residual of `params` on `values`.
pub fn conditional_sum_of_squares(config: &SarimaConfig, values: &[Option<f64>], params: &[f64]) -> f64 {
    let (ar, ma) = config.polynomials(params);
    let run = recurse(&ar, &ma, values, 0);
    if run.residual_count == 0 {
        return LARGE_COST;
    }
    let cost = run.sum_of_squares / run.residual_count as f64;
    if cost.is_finite() {
        cost
    } else {
        LARGE_COST
    }
}

struct CssProblem {
    config: SarimaConfig,
    values: Vec<Option<f64>>,
}

impl CostFunction for CssProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        Ok(conditional_sum_of_squares(&self.config, &self.values, param))
    }
}

/// A fitted seasonal ARIMA, ready to forecast past the end of its training
/// series.
#[derive(Debug, Clone)]
pub struct SarimaModel {
    coefficients: Vec<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    history: Vec<Option<f64>>,
    cost: f64,
}

impl SarimaModel {
    /// Estimate the coefficients on `train`.
    ///
    /// Leading missing values are dropped; interior ones are skipped by the
    /// recursion. Fails when fewer usable observations remain than
    /// coefficients to estimate, or when the solver finds nothing finite.
    pub fn fit(config: &SarimaConfig, train: &[Option<f64>]) -> Result<Self> {
        let Some(first) = train.iter().position(Option::is_some) else {
            return Err(ModelError::fit(MODEL, "no training observations"));
        };
        let history = train[first..].to_vec();

        let k = config.num_params();
        let conditioning = config.p
            + config.seasonal_p * config.period
            + config.d
            + config.seasonal_d * config.period;
        let usable = history.iter().skip(conditioning).flatten().count();
        if usable <= k {
            return Err(ModelError::fit(
                MODEL,
                format!(
                    "insufficient training data: {} usable observations after {} conditioning days, {} coefficients",
                    usable, conditioning, k
                ),
            ));
        }

        let coefficients = if k == 0 {
            Vec::new()
        } else {
            estimate(config, &history)?
        };
        let cost = conditional_sum_of_squares(config, &history, &coefficients);
        if cost >= LARGE_COST {
            return Err(ModelError::fit(MODEL, "recursion diverged at the best coefficients"));
        }

        let (ar, ma) = config.polynomials(&coefficients);
        info!(
            "Fitted SARIMA({},{},{})x({},{},{},{}) on {} days: coefficients {:?}, mean squared residual {:.4}",
            config.p,
            config.d,
            config.q,
            config.seasonal_p,
            config.seasonal_d,
            config.seasonal_q,
            config.period,
            history.len(),
            coefficients,
            cost
        );
        Ok(SarimaModel {
            coefficients,
            ar,
            ma,
            history,
            cost,
        })
    }

    /// `[phi.., Phi.., theta.., Theta..]`
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Mean squared one-step residual at the fitted coefficients.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Forecast the `horizon` days following the training series.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let run = recurse(&self.ar, &self.ma, &self.history, horizon);
        run.path[self.history.len()..].to_vec()
    }
}

/// Minimize the conditional sum of squares from a simplex around zero.
fn estimate(config: &SarimaConfig, history: &[Option<f64>]) -> Result<Vec<f64>> {
    let k = config.num_params();
    let origin = vec![0.0; k];
    let mut simplex = vec![origin.clone()];
    for i in 0..k {
        let mut vertex = origin.clone();
        vertex[i] = config.initial_step;
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(config.sd_tolerance)
        .map_err(|e| ModelError::fit(MODEL, e.to_string()))?;
    let problem = CssProblem {
        config: *config,
        values: history.to_vec(),
    };
    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(config.max_iters))
        .run()
        .map_err(|e| ModelError::fit(MODEL, e.to_string()))?;

    debug!(
        "Nelder-Mead stopped after {} iterations with cost {}",
        result.state.get_iter(),
        result.state.get_best_cost()
    );
    let best = result
        .state
        .get_best_param()
        .ok_or_else(|| ModelError::fit(MODEL, "solver returned no parameters"))?
        .clone();
    if best.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::fit(MODEL, "solver returned non-finite coefficients"));
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const WEEK: [f64; 7] = [1.5, -0.5, 2.0, 0.0, -1.0, 3.0, -2.5];

    fn trend_and_week(days: usize) -> Vec<f64> {
        (0..days)
            .map(|t| 12.0 + 0.05 * t as f64 + WEEK[t % 7])
            .collect()
    }

    fn noisy(days: usize) -> Vec<Option<f64>> {
        (0..days)
            .map(|t| {
                let t = t as f64;
                Some(15.0 + 5.0 * (t * 2.0 * std::f64::consts::PI / 7.0).sin() + (t * t * 0.37).sin())
            })
            .collect()
    }

    #[test]
    fn test_differencing_polynomial() {
        assert_eq!(differencing_polynomial(1, 0, 7), vec![1.0, -1.0]);
        assert_eq!(
            differencing_polynomial(1, 1, 3),
            vec![1.0, -1.0, 0.0, -1.0, 1.0]
        );
        assert_eq!(differencing_polynomial(0, 0, 7), vec![1.0]);
    }

    #[test]
    fn test_default_polynomial_degrees() {
        let config = SarimaConfig::default();
        let (ar, ma) = config.polynomials(&[0.5, 0.2, 0.3, -0.4]);
        assert_eq!(ar.len(), 17);
        assert_eq!(ma.len(), 9);
        // (1 + 0.3B)(1 - 0.4B^7)
        assert_abs_diff_eq!(ma[1], 0.3);
        assert_abs_diff_eq!(ma[7], -0.4);
        assert_abs_diff_eq!(ma[8], -0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_forecast_continues_trend_and_weekly_cycle() {
        let series = trend_and_week(70);
        let train: Vec<Option<f64>> = series[..56].iter().copied().map(Some).collect();
        let model = SarimaModel::fit(&SarimaConfig::default(), &train).unwrap();
        let forecast = model.forecast(14);
        assert_eq!(forecast.len(), 14);
        for (predicted, actual) in forecast.iter().zip(&series[56..]) {
            assert_abs_diff_eq!(*predicted, *actual, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fit_does_not_worsen_starting_point() {
        let config = SarimaConfig::default();
        let train = noisy(120);
        let model = SarimaModel::fit(&config, &train).unwrap();
        let at_origin = conditional_sum_of_squares(&config, &train, &[0.0; 4]);
        assert!(model.cost() <= at_origin);
        assert_eq!(model.coefficients().len(), 4);
        assert!(model.forecast(30).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_training_values_are_skipped() {
        let mut train = noisy(90);
        train[0] = None;
        train[40] = None;
        train[41] = None;
        train[89] = None;
        let model = SarimaModel::fit(&SarimaConfig::default(), &train).unwrap();
        let forecast = model.forecast(10);
        assert_eq!(forecast.len(), 10);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_training_data_is_a_fit_error() {
        let config = SarimaConfig::default();
        assert!(matches!(
            SarimaModel::fit(&config, &[]),
            Err(ModelError::Fit { model: "sarima", .. })
        ));
        assert!(matches!(
            SarimaModel::fit(&config, &[None, None]),
            Err(ModelError::Fit { .. })
        ));
    }

    #[test]
    fn test_short_training_data_is_a_fit_error() {
        let train: Vec<Option<f64>> = (0..18).map(|t| Some(t as f64)).collect();
        assert!(matches!(
            SarimaModel::fit(&SarimaConfig::default(), &train),
            Err(ModelError::Fit { .. })
        ));
    }

    #[test]
    fn test_zero_order_model_is_random_walk() {
        let config = SarimaConfig {
            p: 0,
            q: 0,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            ..SarimaConfig::default()
        };
        let train = vec![Some(1.0), Some(4.0), Some(2.0), Some(6.0)];
        let model = SarimaModel::fit(&config, &train).unwrap();
        assert_eq!(model.forecast(3), vec![6.0, 6.0, 6.0]);
    }
}
