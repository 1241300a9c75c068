//! Score one forecaster on the test window of a processed dataset.

use crate::plot::write_forecast_plot;
use anyhow::Context;
use log::info;
use std::path::Path;
use wx_data::{dataset::read_dataset_path, FeatureRow};
use wx_model::{
    evaluate, CsvMetricsLog, Forecaster, ForecasterKind, Holdout, Metrics, MetricsRecord,
    MetricsSink,
};

pub const DEFAULT_METRICS_OUT: &str = "reports/metrics/metrics.csv";
pub const DEFAULT_PLOT_OUT: &str = "reports/figures/test_pred.svg";

#[derive(Debug, Clone)]
pub struct BacktestOptions {
    pub dataset: String,
    pub model: ForecasterKind,
    /// Score only the first N test days; the whole window when `None`
    pub horizon: Option<usize>,
    pub metrics_out: String,
    pub plot_out: String,
}

/// Forecast the test window, append the scores to the metrics log and draw
/// actual against predicted.
pub fn run_backtest(options: &BacktestOptions) -> anyhow::Result<Metrics> {
    let rows = read_dataset_path(Path::new(&options.dataset))
        .with_context(|| format!("reading dataset {}", options.dataset))?;
    let mut holdout = Holdout::from_rows(&rows)?;
    if let Some(horizon) = options.horizon {
        if horizon == 0 {
            anyhow::bail!("horizon must be at least one day");
        }
        holdout = holdout.limit(horizon);
    }
    info!(
        "Backtesting {} on {} train and {} test days from {}",
        options.model,
        holdout.train_len(),
        holdout.test_len(),
        options.dataset
    );

    let target: Vec<Option<f64>> = rows.iter().map(FeatureRow::target).collect();
    let forecaster = Forecaster::from(options.model);
    let predicted = forecaster.forecast(&target, &holdout, &rows)?;
    let actual = &target[holdout.test_range()];
    let metrics = evaluate(actual, &predicted)?;

    CsvMetricsLog::new(&options.metrics_out).record(&MetricsRecord::new(forecaster.name(), &metrics))?;

    write_forecast_plot(
        Path::new(&options.plot_out),
        &format!("{} - test window", forecaster.name()),
        holdout.test_dates(),
        actual,
        &predicted,
    )?;
    info!("Saved plot to {}", options.plot_out);
    Ok(metrics)
}
