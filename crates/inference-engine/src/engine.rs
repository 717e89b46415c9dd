//! Inference Engine Implementation

use crate::classifier::Classifier;
use crate::InferenceError;
use feature_engine::{ArtifactCache, FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Name of the arg-max class
    pub class_name: String,
    pub class_index: usize,
    /// Unrounded softmax output in class order
    pub probabilities: Vec<f64>,
    /// Probability of class index 1, rounded to 4 decimals
    pub probability_graduate: f64,
    /// Probability of class index 0, rounded to 4 decimals
    pub probability_dropout: f64,
    /// Inference latency in microseconds
    pub latency_us: u64,
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .map(|&v| v as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Classifier plus the fitted transforms it was trained behind
pub struct InferenceEngine {
    classifier: Box<dyn Classifier>,
    artifacts: Arc<ArtifactCache>,
}

impl InferenceEngine {
    pub fn new(
        classifier: Box<dyn Classifier>,
        artifacts: Arc<ArtifactCache>,
    ) -> Result<Self, InferenceError> {
        if classifier.input_dim() != FEATURE_DIMENSION {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "classifier expects {} inputs, feature space has {}",
                classifier.input_dim(),
                FEATURE_DIMENSION
            )));
        }
        info!(
            "Creating inference engine: {} inputs, {} classes",
            classifier.input_dim(),
            classifier.num_classes()
        );
        Ok(Self {
            classifier,
            artifacts,
        })
    }

    /// Build the fitted artifacts now and check the class count agrees
    /// with the classifier
    pub fn warm_up(&self) -> Result<Vec<String>, InferenceError> {
        let artifacts = self.artifacts.get_or_build()?;
        let classes = artifacts.class_names();
        if classes.len() != self.classifier.num_classes() {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "classifier has {} outputs, fitted labels are {:?}",
                self.classifier.num_classes(),
                classes
            )));
        }
        Ok(classes.to_vec())
    }

    /// Class names if the artifacts have been built
    pub fn class_names(&self) -> Option<Vec<String>> {
        self.artifacts.get().map(|a| a.class_names().to_vec())
    }

    /// Transform, classify and pick the most probable class
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let start = Instant::now();

        let artifacts = self.artifacts.get_or_build()?;
        let input = artifacts.transform(features);
        let logits = self.classifier.logits(input.view())?;

        if logits.len() != artifacts.class_names().len() {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "classifier produced {} logits for {} classes",
                logits.len(),
                artifacts.class_names().len()
            )));
        }

        let probabilities = softmax(&logits.to_vec());
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(InferenceError::InferenceFailed(format!(
                "non-finite logits {:?}",
                logits.to_vec()
            )));
        }

        let mut class_index = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[class_index] {
                class_index = i;
            }
        }
        let class_name = artifacts
            .class_name(class_index)
            .ok_or_else(|| {
                InferenceError::InferenceFailed(format!("no class name for index {}", class_index))
            })?
            .to_string();

        let probability_graduate = round4(probabilities.get(1).copied().unwrap_or(0.0));
        let probability_dropout = round4(1.0 - probability_graduate);

        let latency_us = start.elapsed().as_micros() as u64;
        debug!(
            "Predicted {} (p1={:.4}) in {}us",
            class_name, probability_graduate, latency_us
        );

        Ok(Prediction {
            class_name,
            class_index,
            probabilities,
            probability_graduate,
            probability_dropout,
            latency_us,
        })
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("input_dim", &self.classifier.input_dim())
            .field("num_classes", &self.classifier.num_classes())
            .field("artifacts", &self.artifacts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::MlpClassifier;
    use data_prep::{Column, Frame};
    use feature_engine::{Feature, FeatureError, FittedArtifacts, TransformFitter};
    use ndarray::{Array1, ArrayView1};
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::OnceLock;

    /// Returns the same logits for every input
    struct FixedLogits(Vec<f32>);

    impl Classifier for FixedLogits {
        fn input_dim(&self) -> usize {
            FEATURE_DIMENSION
        }

        fn num_classes(&self) -> usize {
            self.0.len()
        }

        fn logits(&self, _input: ArrayView1<f32>) -> Result<Array1<f32>, InferenceError> {
            Ok(Array1::from(self.0.clone()))
        }
    }

    fn fitted() -> FittedArtifacts {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let n = 80;
        let mut columns: Vec<Column> = Feature::ALL
            .iter()
            .map(|f| Column::numeric(f.name(), (0..n).map(|_| rng.gen_range(0.0..10.0)).collect()))
            .collect();
        columns.push(Column::text(
            "target",
            (0..n)
                .map(|i| ["Graduate", "Dropout", "Enrolled"][i % 3].to_string())
                .collect(),
        ));
        TransformFitter::default()
            .fit(&Frame::new(columns).unwrap())
            .unwrap()
    }

    fn engine_with(classifier: Box<dyn Classifier>) -> InferenceEngine {
        InferenceEngine::new(classifier, Arc::new(ArtifactCache::prebuilt(fitted()))).unwrap()
    }

    fn mlp_engine() -> &'static InferenceEngine {
        static ENGINE: OnceLock<InferenceEngine> = OnceLock::new();
        ENGINE.get_or_init(|| {
            let mlp = MlpClassifier::from_json_str(&crate::mlp::tests::state_dict_json(2.0)).unwrap();
            engine_with(Box::new(mlp))
        })
    }

    #[test]
    fn test_softmax() {
        let p = softmax(&[1.0, 1.0]);
        assert_eq!(p, vec![0.5, 0.5]);

        let p = softmax(&[1000.0, 0.0]);
        assert!((p[0] - 1.0).abs() < 1e-12);
        assert!(p[1] >= 0.0);
    }

    #[test]
    fn test_argmax_maps_to_sorted_class_name() {
        let engine = engine_with(Box::new(FixedLogits(vec![0.0, 2.0])));
        let prediction = engine.predict(&FeatureVector::default()).unwrap();
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.class_name, "Graduate");
        assert_eq!(prediction.probability_graduate, 0.8808);
        assert_eq!(prediction.probability_dropout, 0.1192);

        let engine = engine_with(Box::new(FixedLogits(vec![3.0, -1.0])));
        let prediction = engine.predict(&FeatureVector::default()).unwrap();
        assert_eq!(prediction.class_name, "Dropout");
    }

    #[test]
    fn test_class_count_mismatch() {
        let engine = engine_with(Box::new(FixedLogits(vec![0.1, 0.2, 0.3])));
        assert!(matches!(
            engine.predict(&FeatureVector::default()),
            Err(InferenceError::ArchitectureMismatch(_))
        ));
        assert!(engine.warm_up().is_err());
    }

    #[test]
    fn test_warm_up_returns_classes() {
        let engine = engine_with(Box::new(FixedLogits(vec![0.0, 0.0])));
        assert_eq!(engine.warm_up().unwrap(), vec!["Dropout".to_string(), "Graduate".to_string()]);
        assert_eq!(engine.class_names(), Some(vec!["Dropout".to_string(), "Graduate".to_string()]));
    }

    #[test]
    fn test_artifact_failure_propagates() {
        let cache = ArtifactCache::new(|| Err(FeatureError::MissingLabel("target".to_string())));
        let engine =
            InferenceEngine::new(Box::new(FixedLogits(vec![0.0, 1.0])), Arc::new(cache)).unwrap();
        assert!(matches!(
            engine.predict(&FeatureVector::default()),
            Err(InferenceError::Feature(FeatureError::MissingLabel(_)))
        ));
    }

    #[test]
    fn test_wrong_input_dimension_rejected() {
        struct Narrow;
        impl Classifier for Narrow {
            fn input_dim(&self) -> usize {
                4
            }
            fn num_classes(&self) -> usize {
                2
            }
            fn logits(&self, _input: ArrayView1<f32>) -> Result<Array1<f32>, InferenceError> {
                Ok(Array1::zeros(2))
            }
        }
        let cache = Arc::new(ArtifactCache::prebuilt(fitted()));
        assert!(InferenceEngine::new(Box::new(Narrow), cache).is_err());
    }

    proptest! {
        #[test]
        fn probabilities_sum_to_one(values in proptest::array::uniform16(-50.0f64..50.0)) {
            let prediction = mlp_engine().predict(&FeatureVector::from_array(values)).unwrap();

            let raw: f64 = prediction.probabilities.iter().sum();
            prop_assert!((raw - 1.0).abs() < 1e-6);
            prop_assert!((prediction.probability_graduate + prediction.probability_dropout - 1.0).abs() < 1e-6);

            let higher = if prediction.probabilities[1] > prediction.probabilities[0] { 1 } else { 0 };
            prop_assert_eq!(prediction.class_index, higher);
            prop_assert_eq!(
                prediction.class_name.as_str(),
                if higher == 1 { "Graduate" } else { "Dropout" }
            );
        }
    }
}
