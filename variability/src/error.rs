use thiserror::Error;

use crate::event_log::import_xes::XESParseError;

/// Errors raised while analysing event logs or writing their results
#[derive(Debug, Error)]
pub enum VariabilityError {
    /// The event log could not be parsed
    #[error(transparent)]
    Xes(#[from] XESParseError),
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A chart could not be rendered
    #[error("Failed to render chart '{title}': {message}")]
    Plot {
        /// Title of the chart
        title: String,
        /// Error reported by the drawing backend
        message: String,
    },
    /// Writing a CSV report failed
    #[error("Failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    /// Writing a JSON report failed
    #[error("Failed to write JSON report: {0}")]
    Json(#[from] serde_json::Error),
}
