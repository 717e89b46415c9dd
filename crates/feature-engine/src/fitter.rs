//! Transform fitting on the prepared dataset

use crate::features::{Feature, FeatureVector, FEATURE_DIMENSION};
use crate::transform::{StandardScaler, Whitening};
use crate::FeatureError;
use data_prep::{prepare, CategoricalEncoder, Frame, OutlierFilter};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Fitting recipe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitterConfig {
    /// Name of the label column after header normalization
    pub label_column: String,
    /// Label whose rows are left out of fitting
    pub excluded_label: String,
    /// Share of eligible rows held out
    pub test_fraction: f64,
    /// Seed for the train/held-out shuffle
    pub split_seed: u64,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            label_column: "target".to_string(),
            excluded_label: "Enrolled".to_string(),
            test_fraction: 0.2,
            split_seed: 1,
        }
    }
}

/// Immutable result of fitting: scaler, whitening and class order
#[derive(Debug, Clone, PartialEq)]
pub struct FittedArtifacts {
    scaler: StandardScaler,
    whitening: Whitening,
    class_names: Vec<String>,
    training_rows: usize,
}

impl FittedArtifacts {
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn whitening(&self) -> &Whitening {
        &self.whitening
    }

    /// Class labels sorted lexicographically; index = class id
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.class_names.get(index).map(String::as_str)
    }

    /// Rows the transforms were fitted on
    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Standardize then whiten one feature vector
    pub fn transform(&self, features: &FeatureVector) -> Array1<f32> {
        let scaled = self.scaler.transform_one(features.to_array().view());
        self.whitening
            .transform_one(scaled.view())
            .mapv(|v| v as f32)
    }
}

/// Fits `FittedArtifacts` from an encoded dataset frame
#[derive(Debug, Clone, Default)]
pub struct TransformFitter {
    config: FitterConfig,
}

impl TransformFitter {
    pub fn new(config: FitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitterConfig {
        &self.config
    }

    /// Read, prepare and fit from the dataset CSV
    pub fn fit_csv(
        &self,
        path: &Path,
        filter: &OutlierFilter,
        encoder: &CategoricalEncoder,
    ) -> Result<FittedArtifacts, FeatureError> {
        let raw = Frame::read_csv(path)?;
        let encoded = prepare(raw, filter, encoder)?;
        self.fit(&encoded)
    }

    /// Fit on an already normalized, filtered and encoded frame
    pub fn fit(&self, encoded: &Frame) -> Result<FittedArtifacts, FeatureError> {
        let label = &self.config.label_column;
        let labels = encoded
            .column(label)
            .and_then(|c| c.as_text())
            .ok_or_else(|| FeatureError::MissingLabel(label.clone()))?;

        let eligible: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l != self.config.excluded_label)
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return Err(FeatureError::EmptyTrainingSet {
                excluded: self.config.excluded_label.clone(),
            });
        }

        let class_names: Vec<String> = eligible
            .iter()
            .map(|&i| labels[i].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        info!(
            "Fitting on {} of {} rows, classes {:?}",
            eligible.len(),
            labels.len(),
            class_names
        );

        let train = self.training_rows(&eligible);
        if train.is_empty() {
            return Err(FeatureError::EmptyTrainingSet {
                excluded: self.config.excluded_label.clone(),
            });
        }

        let x = feature_matrix(encoded, &train)?;
        let scaler = StandardScaler::fit(x.view())?;
        let scaled = scaler.transform(x.view());
        let whitening = Whitening::fit(scaled.view())?;

        info!("Fitted scaler and whitening on {} training rows", train.len());

        Ok(FittedArtifacts {
            scaler,
            whitening,
            class_names,
            training_rows: train.len(),
        })
    }

    /// Seeded shuffle; the first `ceil(test_fraction * n)` rows are held out
    fn training_rows(&self, eligible: &[usize]) -> Vec<usize> {
        let mut shuffled = eligible.to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.split_seed);
        shuffled.shuffle(&mut rng);

        let n_test = ((self.config.test_fraction * shuffled.len() as f64).ceil() as usize)
            .min(shuffled.len());
        debug!("Holding out {} of {} rows", n_test, shuffled.len());

        shuffled.split_off(n_test)
    }
}

/// Training rows x features, in `Feature::ALL` order
fn feature_matrix(encoded: &Frame, rows: &[usize]) -> Result<Array2<f64>, FeatureError> {
    let mut columns = Vec::with_capacity(FEATURE_DIMENSION);
    let mut missing = Vec::new();

    for feature in Feature::ALL {
        match encoded.column(feature.name()).and_then(|c| c.as_numeric()) {
            Some(values) => columns.push(values),
            None => missing.push(feature.name().to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(FeatureError::Configuration { missing });
    }

    Ok(Array2::from_shape_fn((rows.len(), FEATURE_DIMENSION), |(i, j)| {
        columns[j][rows[i]]
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use data_prep::Column;
    use rand::Rng;

    /// Encoded frame with every feature column and a label per row
    pub(crate) fn encoded_frame(labels: &[&str]) -> Frame {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = labels.len();
        let mut columns: Vec<Column> = Feature::ALL
            .iter()
            .map(|f| {
                let values = (0..n).map(|_| rng.gen_range(0.0..20.0)).collect();
                Column::numeric(f.name(), values)
            })
            .collect();
        columns.push(Column::text(
            "target",
            labels.iter().map(|l| l.to_string()).collect(),
        ));
        Frame::new(columns).unwrap()
    }

    fn mixed_labels(n: usize) -> Vec<&'static str> {
        (0..n)
            .map(|i| match i % 3 {
                0 => "Graduate",
                1 => "Dropout",
                _ => "Enrolled",
            })
            .collect()
    }

    #[test]
    fn test_class_names_sorted() {
        let artifacts = TransformFitter::default().fit(&encoded_frame(&mixed_labels(90))).unwrap();
        assert_eq!(artifacts.class_names(), &["Dropout".to_string(), "Graduate".to_string()]);
        assert_eq!(artifacts.class_name(1), Some("Graduate"));
    }

    #[test]
    fn test_enrolled_rows_excluded() {
        // 60 eligible rows, ceil(0.2 * 60) = 12 held out
        let artifacts = TransformFitter::default().fit(&encoded_frame(&mixed_labels(90))).unwrap();
        assert_eq!(artifacts.training_rows(), 48);
        assert!(!artifacts.class_names().contains(&"Enrolled".to_string()));
    }

    #[test]
    fn test_only_enrolled_fails() {
        let frame = encoded_frame(&["Enrolled"; 30]);
        let result = TransformFitter::default().fit(&frame);
        assert!(matches!(result, Err(FeatureError::EmptyTrainingSet { .. })));
    }

    #[test]
    fn test_missing_feature_column_is_configuration_error() {
        let frame = encoded_frame(&mixed_labels(30));
        let columns: Vec<Column> = frame
            .into_columns()
            .into_iter()
            .filter(|c| c.name != "debtor_1")
            .collect();
        let frame = Frame::new(columns).unwrap();

        match TransformFitter::default().fit(&frame) {
            Err(FeatureError::Configuration { missing }) => {
                assert_eq!(missing, vec!["debtor_1".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_label_column() {
        let frame = Frame::new(vec![Column::numeric("gender_1", vec![1.0])]).unwrap();
        assert!(matches!(
            TransformFitter::default().fit(&frame),
            Err(FeatureError::MissingLabel(_))
        ));
    }

    #[test]
    fn test_split_is_deterministic() {
        let fitter = TransformFitter::default();
        let eligible: Vec<usize> = (0..50).collect();
        assert_eq!(fitter.training_rows(&eligible), fitter.training_rows(&eligible));

        let other = TransformFitter::new(FitterConfig {
            split_seed: 2,
            ..FitterConfig::default()
        });
        assert_ne!(fitter.training_rows(&eligible), other.training_rows(&eligible));
    }

    #[test]
    fn test_refit_is_identical() {
        let frame = encoded_frame(&mixed_labels(60));
        let fitter = TransformFitter::default();
        assert_eq!(fitter.fit(&frame).unwrap(), fitter.fit(&frame).unwrap());
    }

    #[test]
    fn test_fit_csv_end_to_end() {
        use std::io::Write;

        let mut csv = String::from(
            "Marital status;Application mode;Debtor;Tuition fees up to date;Gender;Scholarship holder;\
             Age at enrollment;Curricular units 1st sem (enrolled);Curricular units 1st sem (approved);\
             Curricular units 1st sem (grade);Curricular units 2nd sem (enrolled);\
             Curricular units 2nd sem (approved);Curricular units 2nd sem (grade);Target\n",
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for i in 0..120 {
            let target = ["Graduate", "Dropout", "Enrolled"][i % 3];
            csv.push_str(&format!(
                "1;{};{};{};{};{};{};6;{};{:.2};6;{};{:.2};{}\n",
                1 + i % 2,
                i % 2,
                (i / 2) % 2,
                (i / 3) % 2,
                (i / 5) % 2,
                18 + i % 7,
                rng.gen_range(0..7),
                rng.gen_range(10.0..15.0),
                rng.gen_range(0..7),
                rng.gen_range(10.0..15.0),
                target
            ));
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(csv.as_bytes()).unwrap();

        let artifacts = TransformFitter::default()
            .fit_csv(file.path(), &OutlierFilter::default(), &CategoricalEncoder::student_dataset())
            .unwrap();
        assert_eq!(artifacts.class_names(), &["Dropout".to_string(), "Graduate".to_string()]);

        let transformed = artifacts.transform(&FeatureVector::default());
        assert_eq!(transformed.len(), FEATURE_DIMENSION);
        assert!(transformed.iter().all(|v| v.is_finite()));
    }
}
