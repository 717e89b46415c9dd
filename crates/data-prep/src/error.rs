//! Dataset Preparation Error Types

use thiserror::Error;

/// Errors while reading or reshaping a dataset frame
#[derive(Debug, Error)]
pub enum PrepError {
    /// Dataset file could not be opened
    #[error("Failed to open dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Two columns ended up with the same name
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Column lengths disagree
    #[error("Column {column} has {actual} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Categorical cell that cannot be read as an integer code
    #[error("Column {column} has non-numeric category value {value:?}")]
    InvalidCategory { column: String, value: String },
}
