/// Error types for series preparation
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for normalization, feature building and dataset I/O
#[derive(Error, Debug)]
pub enum DataError {
    /// The same calendar day appears twice in one dataset
    #[error("Duplicate observation for {0}")]
    DuplicateDate(NaiveDate),

    /// A processed dataset skips days or is out of order
    #[error("Dataset is not a consecutive daily calendar: {previous} is followed by {next}")]
    CalendarGap { previous: NaiveDate, next: NaiveDate },

    /// A required column is absent from an input file
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// Failed to read or write CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open or create a dataset file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using DataError
pub type Result<T> = std::result::Result<T, DataError>;
