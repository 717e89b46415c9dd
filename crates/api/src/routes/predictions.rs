//! Prediction Routes

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

pub const PREDICTIONS_TOTAL: &str = "student_predictions_total";
pub const PREDICTION_FAILURES_TOTAL: &str = "student_prediction_failures_total";
pub const PREDICTION_LATENCY_SECONDS: &str = "student_prediction_latency_seconds";

/// Response for the predict endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Student display name
    pub student: String,
    /// Predicted class name
    pub prediction: String,
    pub probability_graduate: f64,
    pub probability_dropout: f64,
}

/// Predict the outcome of one stored student.
///
/// A non-integer id is a 404 like any unknown id.
pub async fn predict_student(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start = Instant::now();

    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::StudentNotFound(raw_id.clone()))?;
    let student = state
        .repository
        .get(id)
        .await?
        .ok_or_else(|| ApiError::StudentNotFound(raw_id.clone()))?;

    let features = state.row_builder.build(&student);
    let prediction = match state.engine.predict(&features) {
        Ok(p) => p,
        Err(e) => {
            metrics::counter!(PREDICTION_FAILURES_TOTAL).increment(1);
            return Err(e.into());
        }
    };

    metrics::counter!(PREDICTIONS_TOTAL, "class" => prediction.class_name.clone()).increment(1);
    metrics::histogram!(PREDICTION_LATENCY_SECONDS).record(start.elapsed().as_secs_f64());
    info!(
        "Student {} predicted {} (graduate={:.4}, dropout={:.4})",
        id, prediction.class_name, prediction.probability_graduate, prediction.probability_dropout
    );

    Ok(Json(PredictionResponse {
        student: student.full_name,
        prediction: prediction.class_name,
        probability_graduate: prediction.probability_graduate,
        probability_dropout: prediction.probability_dropout,
    }))
}
