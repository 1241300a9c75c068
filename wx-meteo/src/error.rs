/// Error types for the weather observation library
use thiserror::Error;

/// Main error type for observation retrieval and parsing
#[derive(Error, Debug)]
pub enum MeteoError {
    /// Geocoding returned no match for the query
    #[error("Location not found: {query}")]
    NotFound { query: String },

    /// Upstream answered with an error status or an empty payload
    #[error("Upstream service error ({context}){}: {detail}", .status.map(|s| format!(" status {s}")).unwrap_or_default())]
    UpstreamService {
        context: String,
        status: Option<u16>,
        detail: String,
    },

    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Failed to parse a JSON response body
    #[error("Failed to parse response: {0}")]
    ResponseParse(#[from] serde_json::Error),

    /// Failed to read or write CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open an observation file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from an input file
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),
}

/// Type alias for Results using MeteoError
pub type Result<T> = std::result::Result<T, MeteoError>;
