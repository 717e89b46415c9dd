//! Feature Space and Feature Vector

use crate::FeatureError;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

/// Number of features consumed by the classifier
pub const FEATURE_DIMENSION: usize = 16;

/// The classifier's input features, in canonical vector order.
///
/// The discriminant is the position in the vector; training and
/// inference both read this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    SecondSemApproved = 0,
    FirstSemApproved = 1,
    SecondSemGrade = 2,
    FirstSemGrade = 3,
    TuitionUpToDateOne = 4,
    ScholarshipHolderOne = 5,
    DebtorZero = 6,
    GenderZero = 7,
    SecondSemEnrolled = 8,
    FirstSemEnrolled = 9,
    TuitionUpToDateZero = 10,
    AgeAtEnrollment = 11,
    ApplicationMode = 12,
    ScholarshipHolderZero = 13,
    DebtorOne = 14,
    GenderOne = 15,
}

impl Feature {
    /// Every feature, in vector order
    pub const ALL: [Feature; FEATURE_DIMENSION] = [
        Feature::SecondSemApproved,
        Feature::FirstSemApproved,
        Feature::SecondSemGrade,
        Feature::FirstSemGrade,
        Feature::TuitionUpToDateOne,
        Feature::ScholarshipHolderOne,
        Feature::DebtorZero,
        Feature::GenderZero,
        Feature::SecondSemEnrolled,
        Feature::FirstSemEnrolled,
        Feature::TuitionUpToDateZero,
        Feature::AgeAtEnrollment,
        Feature::ApplicationMode,
        Feature::ScholarshipHolderZero,
        Feature::DebtorOne,
        Feature::GenderOne,
    ];

    /// Column name in the encoded dataset
    pub fn name(self) -> &'static str {
        match self {
            Feature::SecondSemApproved => "curricular_units_2nd_sem_approved",
            Feature::FirstSemApproved => "curricular_units_1st_sem_approved",
            Feature::SecondSemGrade => "curricular_units_2nd_sem_grade",
            Feature::FirstSemGrade => "curricular_units_1st_sem_grade",
            Feature::TuitionUpToDateOne => "tuition_fees_up_to_date_1",
            Feature::ScholarshipHolderOne => "scholarship_holder_1",
            Feature::DebtorZero => "debtor_0",
            Feature::GenderZero => "gender_0",
            Feature::SecondSemEnrolled => "curricular_units_2nd_sem_enrolled",
            Feature::FirstSemEnrolled => "curricular_units_1st_sem_enrolled",
            Feature::TuitionUpToDateZero => "tuition_fees_up_to_date_0",
            Feature::AgeAtEnrollment => "age_at_enrollment",
            Feature::ApplicationMode => "application_mode",
            Feature::ScholarshipHolderZero => "scholarship_holder_0",
            Feature::DebtorOne => "debtor_1",
            Feature::GenderOne => "gender_1",
        }
    }

    /// Position in the feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a feature by column name
    pub fn from_name(name: &str) -> Option<Feature> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Classifier input: one value per `Feature`, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_DIMENSION],
}

impl FeatureVector {
    /// Vector from values already in canonical order
    pub fn from_array(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self { values }
    }

    /// Build from `(name, value)` pairs.
    ///
    /// Every feature name must appear exactly once and no other name may
    /// appear.
    pub fn from_named<I, S>(pairs: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut values = [0.0; FEATURE_DIMENSION];
        let mut seen = [false; FEATURE_DIMENSION];

        for (name, value) in pairs {
            let name = name.as_ref();
            let feature =
                Feature::from_name(name).ok_or_else(|| FeatureError::UnknownFeature(name.to_string()))?;
            if seen[feature.index()] {
                return Err(FeatureError::DuplicateFeature(name.to_string()));
            }
            seen[feature.index()] = true;
            values[feature.index()] = value;
        }

        let missing: Vec<String> = Feature::ALL
            .iter()
            .filter(|f| !seen[f.index()])
            .map(|f| f.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FeatureError::MissingFeatures(missing));
        }

        Ok(Self { values })
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.values[feature.index()] = value;
    }

    /// Values in canonical order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.values.to_vec())
    }

    /// Name-keyed view, one entry per feature
    pub fn to_named(&self) -> BTreeMap<&'static str, f64> {
        Feature::ALL.iter().map(|&f| (f.name(), self.get(f))).collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; FEATURE_DIMENSION],
        }
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.values[feature.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_discriminants() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(Feature::from_name(feature.name()), Some(*feature));
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: std::collections::HashSet<_> = Feature::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), FEATURE_DIMENSION);
    }

    #[test]
    fn test_from_named_roundtrip() {
        let mut vector = FeatureVector::default();
        vector.set(Feature::AgeAtEnrollment, 20.0);
        vector.set(Feature::GenderOne, 1.0);

        let rebuilt = FeatureVector::from_named(vector.to_named()).unwrap();
        assert_eq!(rebuilt, vector);
        assert_eq!(rebuilt[Feature::AgeAtEnrollment], 20.0);
    }

    #[test]
    fn test_from_named_rejects_missing() {
        let pairs: Vec<_> = Feature::ALL[1..].iter().map(|f| (f.name(), 1.0)).collect();
        match FeatureVector::from_named(pairs) {
            Err(FeatureError::MissingFeatures(missing)) => {
                assert_eq!(missing, vec!["curricular_units_2nd_sem_approved".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_named_rejects_extra_and_duplicate() {
        let mut pairs: Vec<(String, f64)> =
            Feature::ALL.iter().map(|f| (f.name().to_string(), 0.0)).collect();
        pairs.push(("marital_status_1".to_string(), 1.0));
        assert!(matches!(
            FeatureVector::from_named(pairs.clone()),
            Err(FeatureError::UnknownFeature(_))
        ));

        pairs.pop();
        pairs.push(("gender_1".to_string(), 1.0));
        assert!(matches!(
            FeatureVector::from_named(pairs),
            Err(FeatureError::DuplicateFeature(name)) if name == "gender_1"
        ));
    }
}
