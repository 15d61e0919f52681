//! Error types for the terroir library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for audit operations.
#[derive(Debug, Error)]
pub enum TerroirError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column referenced by a derivation or check is absent from the table.
    #[error("Missing column: '{column}'")]
    MissingColumn { column: String },

    /// A derived column would overwrite an existing one.
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    /// Two rows share a member identifier.
    #[error("Duplicate member identifier: {0}")]
    DuplicateIdentifier(u64),

    /// A member identifier cell could not be read as a whole number.
    #[error("Invalid member identifier at row {row}: '{value}'")]
    InvalidIdentifier { row: usize, value: String },

    /// A column used in arithmetic holds text.
    #[error("Non-numeric value '{value}' in column '{column}' for member {id}")]
    NonNumeric {
        column: String,
        id: u64,
        value: String,
    },

    /// A column was built with the wrong number of rows.
    #[error("Column '{column}' has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Empty file or no data to audit.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TerroirError {
    /// Shorthand for a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        TerroirError::MissingColumn {
            column: column.into(),
        }
    }
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, TerroirError>;
