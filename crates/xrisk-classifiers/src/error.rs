//! Error types for table loading, schema checks, evaluation and explanation.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, XriskError>;

#[derive(Error, Debug)]
pub enum XriskError {
    /// Malformed delimited input (inconsistent column counts, bad header).
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// A column could not be coerced to its declared type.
    #[error("Schema error in column '{column}': {message}")]
    Schema { column: String, message: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Two tables (or a row and a model) disagree on names, types or levels.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Degenerate or malformed arguments, e.g. labels outside {0, 1}.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A model broke the prediction contract or could not be fitted.
    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl XriskError {
    pub(crate) fn schema(column: impl Into<String>, message: impl Into<String>) -> Self {
        XriskError::Schema {
            column: column.into(),
            message: message.into(),
        }
    }
}
