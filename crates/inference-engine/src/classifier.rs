//! Classifier contract and backend selection

use crate::mlp::MlpClassifier;
use crate::onnx::OnnxClassifier;
use crate::InferenceError;
use ndarray::{Array1, ArrayView1};
use std::path::Path;
use tracing::info;

/// A trained classifier over transformed feature vectors.
///
/// Implementations are immutable after loading and shared across
/// request handlers.
pub trait Classifier: Send + Sync {
    /// Expected length of the input vector
    fn input_dim(&self) -> usize;

    fn num_classes(&self) -> usize;

    /// Raw (pre-softmax) scores for one input vector
    fn logits(&self, input: ArrayView1<f32>) -> Result<Array1<f32>, InferenceError>;
}

/// Load a classifier, picking the backend from the file extension
/// (`.json` state dict or `.onnx` graph)
pub fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>, InferenceError> {
    if !path.exists() {
        return Err(InferenceError::ModelLoad(format!(
            "weights file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let classifier: Box<dyn Classifier> = match extension.as_deref() {
        Some("json") => Box::new(MlpClassifier::from_json_file(path)?),
        Some("onnx") => Box::new(OnnxClassifier::load(path)?),
        other => {
            return Err(InferenceError::ModelLoad(format!(
                "unsupported weights format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            )))
        }
    };

    info!(
        "Classifier loaded from {}: {} inputs, {} classes",
        path.display(),
        classifier.input_dim(),
        classifier.num_classes()
    );
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_classifier(Path::new("/nonexistent/student_model.json"));
        assert!(matches!(result, Err(InferenceError::ModelLoad(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".pt").tempfile().unwrap();
        let result = load_classifier(file.path());
        assert!(matches!(result, Err(InferenceError::ModelLoad(_))));
    }

    #[test]
    fn test_json_backend() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        std::fs::write(file.path(), crate::mlp::tests::state_dict_json(1.0)).unwrap();

        let classifier = load_classifier(file.path()).unwrap();
        assert_eq!(classifier.input_dim(), 16);
        assert_eq!(classifier.num_classes(), 2);
    }

    #[test]
    fn test_onnx_backend() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/linear_2_classes.onnx");
        let classifier = load_classifier(&path).unwrap();
        assert_eq!(classifier.input_dim(), 16);
        assert_eq!(classifier.num_classes(), 2);
    }
}
