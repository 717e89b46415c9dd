//! ONNX classifier backend (tract)

use crate::classifier::Classifier;
use crate::mlp::NUM_CLASSES;
use crate::InferenceError;
use feature_engine::FEATURE_DIMENSION;
use ndarray::{Array1, ArrayView1};
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::{error, info};

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// The trained network exported to ONNX, input shape `[1, 16]`
pub struct OnnxClassifier {
    plan: OnnxPlan,
}

impl OnnxClassifier {
    /// Load, optimize and probe the model; a probe that does not yield
    /// one logit per class rejects the file
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        info!("Loading ONNX classifier from {}", path.display());

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                error!("Failed to load ONNX model: {}", e);
                InferenceError::ModelLoad(e.to_string())
            })?;

        let classifier = Self { plan };
        let probe = classifier.run(&[0.0; FEATURE_DIMENSION])?;
        if probe.len() != NUM_CLASSES {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "model yields {} logits, expected {}",
                probe.len(),
                NUM_CLASSES
            )));
        }

        Ok(classifier)
    }

    fn run(&self, input: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_shape(&[1, input.len()], input)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let logits = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?
            .as_slice::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        Ok(logits.to_vec())
    }
}

impl Classifier for OnnxClassifier {
    fn input_dim(&self) -> usize {
        FEATURE_DIMENSION
    }

    fn num_classes(&self) -> usize {
        NUM_CLASSES
    }

    fn logits(&self, input: ArrayView1<f32>) -> Result<Array1<f32>, InferenceError> {
        if input.len() != FEATURE_DIMENSION {
            return Err(InferenceError::InvalidInputShape {
                expected: FEATURE_DIMENSION,
                actual: input.len(),
            });
        }
        let data: Vec<f32> = input.iter().copied().collect();
        Ok(Array1::from(self.run(&data)?))
    }
}
