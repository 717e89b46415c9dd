//! Storage Layer
//!
//! SQLite persistence for demo student records, plus the one-time loader
//! that seeds them from the dataset file.

mod loader;
mod record;
mod repository;

pub use loader::{load_enrolled_students, read_enrolled, LoadOutcome, LoaderOptions, SOURCE_COLUMNS};
pub use record::{NewStudent, StudentProfile, StudentRecord, PROFILE_COLUMNS, PROFILE_LEN};
pub use repository::StudentRepository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Dataset error: {0}")]
    Dataset(String),
    #[error("Only found {found} students with Target={label}, need {required}")]
    InsufficientRecords {
        label: String,
        found: usize,
        required: usize,
    },
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        StorageError::Dataset(err.to_string())
    }
}
