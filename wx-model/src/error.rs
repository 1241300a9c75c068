/// Error types for forecasting and evaluation
use thiserror::Error;

/// Main error type for forecasters, the evaluator and metrics sinks
#[derive(Error, Debug)]
pub enum ModelError {
    /// Caller supplied data the operation cannot accept
    #[error("Invalid input: {0}")]
    Input(String),

    /// A model could not be estimated from its training data
    #[error("Failed to fit {model}: {reason}")]
    Fit { model: &'static str, reason: String },

    /// Failed to write the metrics log
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open or create the metrics log
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn fit(model: &'static str, reason: impl Into<String>) -> Self {
        ModelError::Fit {
            model,
            reason: reason.into(),
        }
    }
}

/// Type alias for Results using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
