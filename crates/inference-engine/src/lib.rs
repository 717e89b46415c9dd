//! Inference Engine
//!
//! Runs the fixed-architecture dropout/graduate classifier on feature
//! vectors transformed by the fitted scaler and whitening.

mod classifier;
mod engine;
mod mlp;
mod onnx;

pub use classifier::{load_classifier, Classifier};
pub use engine::{softmax, InferenceEngine, Prediction};
pub use mlp::{DenseLayer, MlpClassifier, HIDDEN_SIZES, NUM_CLASSES};
pub use onnx::OnnxClassifier;

use feature_engine::FeatureError;
use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Architecture mismatch: {0}")]
    ArchitectureMismatch(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error(transparent)]
    Feature(#[from] FeatureError),
}
