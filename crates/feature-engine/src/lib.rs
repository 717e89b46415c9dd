//! Feature Engineering Engine
//!
//! Defines the classifier's 16-feature space, assembles feature rows from
//! stored students, and fits and caches the standardization + whitening
//! transforms applied before inference.

mod cache;
mod features;
mod fitter;
mod row;
mod transform;

pub use cache::ArtifactCache;
pub use features::{Feature, FeatureVector, FEATURE_DIMENSION};
pub use fitter::{FittedArtifacts, FitterConfig, TransformFitter};
pub use row::FeatureRowBuilder;
pub use transform::{StandardScaler, Whitening};

use data_prep::PrepError;
use thiserror::Error;

/// Errors during feature assembly and transform fitting
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Required feature columns absent from the encoded training data
    #[error("Configuration error: missing required feature columns {missing:?}")]
    Configuration { missing: Vec<String> },
    #[error("No training rows left after excluding label {excluded:?}")]
    EmptyTrainingSet { excluded: String },
    #[error("Need at least {required} training rows, got {rows}")]
    TooFewTrainingRows { rows: usize, required: usize },
    #[error("Label column {0:?} missing or not text")]
    MissingLabel(String),
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
    #[error("Duplicate feature: {0}")]
    DuplicateFeature(String),
    #[error("Missing features: {0:?}")]
    MissingFeatures(Vec<String>),
    #[error("Decomposition failed: {0}")]
    Decomposition(String),
    #[error("Artifacts unavailable: {0}")]
    Artifacts(String),
    #[error(transparent)]
    Prep(#[from] PrepError),
}
