//! Native feed-forward classifier

use crate::classifier::Classifier;
use crate::InferenceError;
use feature_engine::FEATURE_DIMENSION;
use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Hidden layer widths of the trained network
pub const HIDDEN_SIZES: [usize; 4] = [128, 64, 32, 16];
pub const NUM_CLASSES: usize = 2;

/// Fully connected layer, weight stored `[out, in]`
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl DenseLayer {
    pub fn new(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self, InferenceError> {
        if weight.nrows() != bias.len() {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "bias length {} does not match {} output units",
                bias.len(),
                weight.nrows()
            )));
        }
        Ok(Self { weight, bias })
    }

    pub fn input_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.nrows()
    }

    fn forward(&self, x: ArrayView1<f32>) -> Array1<f32> {
        self.weight.dot(&x) + &self.bias
    }
}

/// One tensor of a state dict export
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Param {
    Matrix(Vec<Vec<f32>>),
    Vector(Vec<f32>),
}

/// ReLU network with linear output.
///
/// Dropout is only active in training, so inference is a plain chain of
/// dense layers.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpClassifier {
    hidden: Vec<DenseLayer>,
    output: DenseLayer,
}

impl MlpClassifier {
    /// Assemble from layers; consecutive layer sizes must chain
    pub fn from_layers(hidden: Vec<DenseLayer>, output: DenseLayer) -> Result<Self, InferenceError> {
        let mut prev: Option<usize> = None;
        for (i, layer) in hidden.iter().chain(std::iter::once(&output)).enumerate() {
            if let Some(expected) = prev {
                if layer.input_dim() != expected {
                    return Err(InferenceError::ArchitectureMismatch(format!(
                        "layer {} expects {} inputs but previous layer yields {}",
                        i,
                        layer.input_dim(),
                        expected
                    )));
                }
            }
            prev = Some(layer.output_dim());
        }
        Ok(Self { hidden, output })
    }

    /// Parse a JSON state dict export of the trained network
    pub fn from_json_str(json: &str) -> Result<Self, InferenceError> {
        let params: BTreeMap<String, Param> =
            serde_json::from_str(json).map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
        Self::from_state_dict(params)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, InferenceError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    fn from_state_dict(mut params: BTreeMap<String, Param>) -> Result<Self, InferenceError> {
        let mut hidden = Vec::with_capacity(HIDDEN_SIZES.len());
        let mut prev = FEATURE_DIMENSION;
        for (i, &size) in HIDDEN_SIZES.iter().enumerate() {
            let prefix = format!("layers.{}", i);
            hidden.push(take_layer(&mut params, &prefix, size, prev)?);
            prev = size;
        }
        let output = take_layer(&mut params, "output", NUM_CLASSES, prev)?;

        if let Some(extra) = params.keys().next() {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "unexpected parameter {}",
                extra
            )));
        }

        debug!("Loaded {} hidden layers from state dict", hidden.len());
        Self::from_layers(hidden, output)
    }
}

fn take_layer(
    params: &mut BTreeMap<String, Param>,
    prefix: &str,
    out_dim: usize,
    in_dim: usize,
) -> Result<DenseLayer, InferenceError> {
    let weight_key = format!("{}.weight", prefix);
    let bias_key = format!("{}.bias", prefix);

    let weight = match params.remove(&weight_key) {
        Some(Param::Matrix(rows)) => matrix(&weight_key, rows)?,
        Some(Param::Vector(_)) => {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "{} must be a matrix",
                weight_key
            )))
        }
        None => return Err(missing(&weight_key)),
    };
    let bias = match params.remove(&bias_key) {
        Some(Param::Vector(values)) => Array1::from(values),
        Some(Param::Matrix(_)) => {
            return Err(InferenceError::ArchitectureMismatch(format!(
                "{} must be a vector",
                bias_key
            )))
        }
        None => return Err(missing(&bias_key)),
    };

    if weight.dim() != (out_dim, in_dim) {
        return Err(InferenceError::ArchitectureMismatch(format!(
            "{} has shape {:?}, expected [{}, {}]",
            weight_key,
            weight.shape(),
            out_dim,
            in_dim
        )));
    }
    DenseLayer::new(weight, bias)
}

fn matrix(key: &str, rows: Vec<Vec<f32>>) -> Result<Array2<f32>, InferenceError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(InferenceError::ArchitectureMismatch(format!("{} has ragged rows", key)));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| InferenceError::ArchitectureMismatch(format!("{}: {}", key, e)))
}

fn missing(key: &str) -> InferenceError {
    InferenceError::ArchitectureMismatch(format!("missing parameter {}", key))
}

impl Classifier for MlpClassifier {
    fn input_dim(&self) -> usize {
        self.hidden
            .first()
            .unwrap_or(&self.output)
            .input_dim()
    }

    fn num_classes(&self) -> usize {
        self.output.output_dim()
    }

    fn logits(&self, input: ArrayView1<f32>) -> Result<Array1<f32>, InferenceError> {
        if input.len() != self.input_dim() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.input_dim(),
                actual: input.len(),
            });
        }

        let mut x = input.to_owned();
        for layer in &self.hidden {
            x = layer.forward(x.view()).mapv(|v| v.max(0.0));
        }
        Ok(self.output.forward(x.view()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::{json, Map, Value};

    /// Deterministic full-size state dict; `scale` multiplies every weight
    pub(crate) fn state_dict_json(scale: f32) -> String {
        state_dict(scale).to_string()
    }

    fn state_dict(scale: f32) -> Value {
        let mut map = Map::new();
        let mut prev = FEATURE_DIMENSION;
        let layer = |map: &mut Map<String, Value>, prefix: &str, out: usize, inp: usize| {
            let weight: Vec<Vec<f32>> = (0..out)
                .map(|o| {
                    (0..inp)
                        .map(|i| scale * (((o * 7 + i * 3) % 11) as f32 - 5.0) / 25.0)
                        .collect()
                })
                .collect();
            let bias: Vec<f32> = (0..out).map(|o| ((o % 5) as f32 - 2.0) / 50.0).collect();
            map.insert(format!("{}.weight", prefix), json!(weight));
            map.insert(format!("{}.bias", prefix), json!(bias));
        };
        for (i, &size) in HIDDEN_SIZES.iter().enumerate() {
            layer(&mut map, &format!("layers.{}", i), size, prev);
            prev = size;
        }
        layer(&mut map, "output", NUM_CLASSES, prev);
        Value::Object(map)
    }

    #[test]
    fn test_forward_small_network() {
        let hidden = DenseLayer::new(array![[1.0, 0.0], [0.0, -1.0]], array![0.0, 0.0]).unwrap();
        let output = DenseLayer::new(array![[1.0, 1.0], [-1.0, 2.0]], array![0.5, 0.0]).unwrap();
        let mlp = MlpClassifier::from_layers(vec![hidden], output).unwrap();

        // ReLU zeroes the negated second input
        let logits = mlp.logits(array![3.0_f32, 2.0].view()).unwrap();
        assert_eq!(logits.to_vec(), vec![3.5, -3.0]);
    }

    #[test]
    fn test_layers_must_chain() {
        let hidden = DenseLayer::new(Array2::zeros((4, 2)), Array1::zeros(4)).unwrap();
        let output = DenseLayer::new(Array2::zeros((2, 3)), Array1::zeros(2)).unwrap();
        assert!(matches!(
            MlpClassifier::from_layers(vec![hidden], output),
            Err(InferenceError::ArchitectureMismatch(_))
        ));
    }

    #[test]
    fn test_bias_length_checked() {
        assert!(DenseLayer::new(Array2::zeros((3, 2)), Array1::zeros(2)).is_err());
    }

    #[test]
    fn test_load_state_dict() {
        let mlp = MlpClassifier::from_json_str(&state_dict_json(1.0)).unwrap();
        assert_eq!(mlp.input_dim(), FEATURE_DIMENSION);
        assert_eq!(mlp.num_classes(), NUM_CLASSES);

        let logits = mlp.logits(Array1::<f32>::ones(FEATURE_DIMENSION).view()).unwrap();
        assert_eq!(logits.len(), 2);
        assert!(logits.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_wrong_hidden_width_rejected() {
        let mut dict = state_dict(1.0);
        dict["layers.1.weight"] = json!(vec![vec![0.0_f32; 128]; 60]);
        dict["layers.1.bias"] = json!(vec![0.0_f32; 60]);

        match MlpClassifier::from_json_str(&dict.to_string()) {
            Err(InferenceError::ArchitectureMismatch(msg)) => assert!(msg.contains("layers.1.weight")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_extra_parameters_rejected() {
        let mut dict = state_dict(1.0);
        dict.as_object_mut().unwrap().remove("output.bias");
        assert!(matches!(
            MlpClassifier::from_json_str(&dict.to_string()),
            Err(InferenceError::ArchitectureMismatch(_))
        ));

        let mut dict = state_dict(1.0);
        dict["layers.4.weight"] = json!([[0.0]]);
        assert!(matches!(
            MlpClassifier::from_json_str(&dict.to_string()),
            Err(InferenceError::ArchitectureMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            MlpClassifier::from_json_str("not json"),
            Err(InferenceError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_input_length_checked() {
        let mlp = MlpClassifier::from_json_str(&state_dict_json(1.0)).unwrap();
        assert!(matches!(
            mlp.logits(Array1::<f32>::zeros(3).view()),
            Err(InferenceError::InvalidInputShape { expected: 16, actual: 3 })
        ));
    }
}
