//! Persistence forecasts: tomorrow looks like today, or like the same day one
//! season ago.

/// Default season length for daily data.
pub const DEFAULT_SEASONAL_PERIOD: usize = 365;

/// Prediction for day `t` is the actual value at `t - 1`.
pub fn persistence(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| t.checked_sub(1).and_then(|prev| values[prev]))
        .collect()
}

/// Prediction for day `t` is the actual value at `t - period`, or the value
/// at `t - 1` when the seasonal value is missing or precedes the series.
pub fn seasonal_persistence(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let fallback = persistence(values);
    (0..values.len())
        .map(|t| {
            t.checked_sub(period)
                .and_then(|lagged| values[lagged])
                .or(fallback[t])
        })
        .collect()
}
