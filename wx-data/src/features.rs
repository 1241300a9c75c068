//! Calendar, lag and rolling-window features over a normalized daily series.
//!
//! Every derived value for day `t` reads only days `<= t`. Each helper states
//! its own null rule: a lag is null when the lagged day is missing or before
//! the series start; a rolling statistic is null unless every day in its
//! window holds a value.

use crate::calendar::NormalizedSeries;
use chrono::{Datelike, NaiveDate};
use log::debug;
use wx_meteo::Observation;

pub const LAGS: [usize; 3] = [1, 7, 14];
pub const SHORT_WINDOW: usize = 7;
pub const LONG_WINDOW: usize = 30;

/// Names of the regressors in [`FeatureRow::regressors`] order.
pub const REGRESSOR_NAMES: [&str; 9] = [
    "tavg_lag_1",
    "tavg_lag_7",
    "tavg_lag_14",
    "tavg_roll_mean_7",
    "tavg_roll_std_7",
    "tavg_roll_mean_30",
    "dow",
    "month",
    "is_weekend",
];

/// One day of the supervised-learning table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub observation: Observation,
    /// 0 = Monday .. 6 = Sunday
    pub dow: u32,
    pub month: u32,
    pub is_weekend: bool,
    pub tavg_lag_1: Option<f64>,
    pub tavg_lag_7: Option<f64>,
    pub tavg_lag_14: Option<f64>,
    pub tavg_roll_mean_7: Option<f64>,
    pub tavg_roll_std_7: Option<f64>,
    pub tavg_roll_mean_30: Option<f64>,
    pub is_test: bool,
}

impl FeatureRow {
    pub fn date(&self) -> NaiveDate {
        self.observation.date
    }

    /// The forecast target, mean daily temperature.
    pub fn target(&self) -> Option<f64> {
        self.observation.tavg
    }

    /// All regressors, or `None` when any of them is null.
    pub fn regressors(&self) -> Option<[f64; 9]> {
        Some([
            self.tavg_lag_1?,
            self.tavg_lag_7?,
            self.tavg_lag_14?,
            self.tavg_roll_mean_7?,
            self.tavg_roll_std_7?,
            self.tavg_roll_mean_30?,
            f64::from(self.dow),
            f64::from(self.month),
            if self.is_weekend { 1.0 } else { 0.0 },
        ])
    }
}

/// `values` shifted forward by `k` days.
pub fn lag(values: &[Option<f64>], k: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| if t >= k { values[t - k] } else { None })
        .collect()
}

/// The trailing window ending at `t` (inclusive), if it fits and is complete.
fn full_window(values: &[Option<f64>], t: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || t + 1 < window {
        return None;
    }
    values[t + 1 - window..=t].iter().copied().collect()
}

/// Trailing mean over `window` days including the current one.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            full_window(values, t, window)
                .map(|w| w.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Trailing sample standard deviation (n - 1 denominator) over `window` days
/// including the current one. Windows shorter than two days are always null.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|t| {
            full_window(values, t, window).map(|w| {
                let mean = w.iter().sum::<f64>() / window as f64;
                let ss = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
                (ss / (window - 1) as f64).sqrt()
            })
        })
        .collect()
}

/// Derive calendar and target features for every day of `series`.
///
/// Rows come back unlabelled (`is_test == false`); apply a
/// [`SplitPolicy`](crate::split::SplitPolicy) afterwards.
pub fn build_features(series: &NormalizedSeries) -> Vec<FeatureRow> {
    let target = series.target();
    let [lag_1, lag_7, lag_14] = LAGS.map(|k| lag(&target, k));
    let roll_mean_7 = rolling_mean(&target, SHORT_WINDOW);
    let roll_std_7 = rolling_std(&target, SHORT_WINDOW);
    let roll_mean_30 = rolling_mean(&target, LONG_WINDOW);
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        debug!("Building features for {} days ({} to {})", series.len(), first, last);
    }

    series
        .records()
        .iter()
        .enumerate()
        .map(|(t, observation)| {
            let dow = observation.date.weekday().num_days_from_monday();
            FeatureRow {
                observation: observation.clone(),
                dow,
                month: observation.date.month(),
                is_weekend: dow >= 5,
                tavg_lag_1: lag_1[t],
                tavg_lag_7: lag_7[t],
                tavg_lag_14: lag_14[t],
                tavg_roll_mean_7: roll_mean_7[t],
                tavg_roll_std_7: roll_std_7[t],
                tavg_roll_mean_30: roll_mean_30[t],
                is_test: false,
            }
        })
        .collect()
}
