//! Feature row assembly from stored student records

use crate::features::{Feature, FeatureVector};
use storage::StudentRecord;
use tracing::debug;

/// Maps a stored student onto the classifier's feature space.
///
/// Binary attributes become a `(one, zero)` indicator pair, matching the
/// two-category one-hot columns seen at fit time. The other six features
/// pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureRowBuilder;

impl FeatureRowBuilder {
    pub fn new() -> Self {
        Self
    }

    /// `(one, zero)` indicators for a stored binary value
    pub fn binary_pair(value: f64) -> (f64, f64) {
        let one = if value >= 1.0 { 1.0 } else { 0.0 };
        (one, 1.0 - one)
    }

    /// Build the feature vector for one student
    pub fn build(&self, student: &StudentRecord) -> FeatureVector {
        let p = &student.profile;
        let (tuition_one, tuition_zero) = Self::binary_pair(p.matricula_al_dia);
        let (scholarship_one, scholarship_zero) = Self::binary_pair(p.becado);
        let (debtor_one, debtor_zero) = Self::binary_pair(p.deudor);
        let (gender_one, gender_zero) = Self::binary_pair(p.genero);

        let mut row = FeatureVector::default();
        row.set(Feature::SecondSemApproved, p.cu2_aprobadas);
        row.set(Feature::FirstSemApproved, p.cu1_aprobadas);
        row.set(Feature::SecondSemGrade, p.cu2_nota);
        row.set(Feature::FirstSemGrade, p.cu1_nota);
        row.set(Feature::TuitionUpToDateOne, tuition_one);
        row.set(Feature::ScholarshipHolderOne, scholarship_one);
        row.set(Feature::DebtorZero, debtor_zero);
        row.set(Feature::GenderZero, gender_zero);
        row.set(Feature::SecondSemEnrolled, p.cu2_inscritas);
        row.set(Feature::FirstSemEnrolled, p.cu1_inscritas);
        row.set(Feature::TuitionUpToDateZero, tuition_zero);
        row.set(Feature::AgeAtEnrollment, p.edad);
        row.set(Feature::ApplicationMode, p.modo_aplicacion);
        row.set(Feature::ScholarshipHolderZero, scholarship_zero);
        row.set(Feature::DebtorOne, debtor_one);
        row.set(Feature::GenderOne, gender_one);

        debug!("Built feature row for student {}", student.id);
        row
    }
}
