use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(err) => match err {
                PipelineError::MissingProfile { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                PipelineError::NoResultsFound { .. } => StatusCode::NOT_FOUND,
                PipelineError::StageTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                PipelineError::StageProcessFailure { .. }
                | PipelineError::MalformedOutput { .. }
                | PipelineError::RankingFailed { .. }
                | PipelineError::Judgment { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, stage, message) = match &self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", None, msg.clone()),
            // Diagnostics were already logged by the pipeline run; only the
            // reason is returned.
            AppError::Pipeline(err) => (err.code(), Some(err.stage().as_str()), err.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "stage": stage,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
