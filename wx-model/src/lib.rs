//! Forecasting strategies for daily mean temperature, scored on a trailing
//! holdout.
//!
//! A [`Forecaster`] predicts the test dates of a [`Holdout`]; [`evaluate`]
//! turns the aligned actual and predicted values into [`Metrics`], which a
//! [`MetricsSink`] records.

pub mod baseline;
pub mod error;
pub mod evaluator;
pub mod forecaster;
pub mod ridge;
pub mod sarima;
pub mod sink;

pub use error::{ModelError, Result};
pub use evaluator::{evaluate, Metrics, MetricsRecord};
pub use forecaster::{Forecaster, ForecasterKind, Holdout};
pub use ridge::RidgeConfig;
pub use sarima::SarimaConfig;
pub use sink::{CsvMetricsLog, MemorySink, MetricsSink};
