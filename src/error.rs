use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid column: {0}")]
    InvalidColumn(String),

    #[error("appointment at row {index} is too ambiguous (confidence={confidence:.2})")]
    AmbiguousAppointment { index: usize, confidence: f32 },
}
