use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::PipelineResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HuntRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct HuntResponse {
    pub run_id: Uuid,
    pub completed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: PipelineResult,
}

/// POST /api/v1/hunt
pub async fn handle_hunt(
    State(state): State<AppState>,
    Json(req): Json<HuntRequest>,
) -> Result<Json<HuntResponse>, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Please enter a role.".to_string()));
    }

    let run_id = Uuid::new_v4();
    let result = state.pipeline.run_with_id(run_id, query).await?;

    Ok(Json(HuntResponse {
        run_id,
        completed_at: Utc::now(),
        result,
    }))
}
