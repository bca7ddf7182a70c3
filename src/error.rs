//! Error types for Paceband

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse export: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Cannot read source: {0}")]
    SourceReadError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),
}
