//! Student Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;
use storage::StudentRecord;

/// Demo listing never returns more than this
pub const MAX_LISTED: usize = 20;

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    MAX_LISTED
}

/// Listing row shown on the demo page
#[derive(Debug, Serialize)]
pub struct StudentSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub source_row: i64,
    pub age_at_enrollment: f64,
    pub first_sem_approved: f64,
    pub second_sem_approved: f64,
    pub tuition_up_to_date: bool,
    pub debtor: bool,
    pub scholarship_holder: bool,
}

impl From<&StudentRecord> for StudentSummary {
    fn from(record: &StudentRecord) -> Self {
        let p = &record.profile;
        Self {
            id: record.id,
            full_name: record.full_name.clone(),
            email: record.email.clone(),
            source_row: record.source_row,
            age_at_enrollment: p.edad,
            first_sem_approved: p.cu1_aprobadas,
            second_sem_approved: p.cu2_aprobadas,
            tuition_up_to_date: p.matricula_al_dia >= 1.0,
            debtor: p.deudor >= 1.0,
            scholarship_holder: p.becado >= 1.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub data: Vec<StudentSummary>,
    pub count: usize,
}

/// List stored demo students
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StudentQuery>,
) -> Result<Json<StudentListResponse>, ApiError> {
    let limit = params.limit.min(MAX_LISTED);
    let records = state.repository.list(limit).await?;
    let data: Vec<StudentSummary> = records.iter().map(StudentSummary::from).collect();

    Ok(Json(StudentListResponse {
        count: data.len(),
        data,
    }))
}
