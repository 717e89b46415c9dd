//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::InferenceError;
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;

/// Failures surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Student {0} not found")]
    StudentNotFound(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("Prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::StudentNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: &'static str,
}

/// Build a JSON error response
pub fn api_error(status: StatusCode, message: &str) -> Response {
    let error_type = if status.is_client_error() {
        "client_error"
    } else {
        "server_error"
    };
    let body = ErrorBody {
        error: ErrorDetail {
            message: message.to_string(),
            error_type,
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        api_error(status, &self.to_string())
    }
}
