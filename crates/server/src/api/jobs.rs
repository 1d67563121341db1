//! Job API handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reelforge_core::{ConfigSource, Job, JobStatus, OrchestratorError, ValidationKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Response for an accepted run request
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub status_url: String,
}

/// HTTP status for an orchestrator error.
///
/// Bad input is the caller's fault (400), a missing config file or job is 404,
/// and missing server-side defaults or an unreadable file are 500.
pub fn error_status(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::Validation(e) => match e.kind {
            ValidationKind::MissingProfileId
            | ValidationKind::MalformedConfig
            | ValidationKind::ProductsPerRunOutOfRange
            | ValidationKind::UnknownDataSource => StatusCode::BAD_REQUEST,
            ValidationKind::ConfigFileNotFound => StatusCode::NOT_FOUND,
            ValidationKind::ConfigFileUnreadable | ValidationKind::MissingIdentifier => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::InvalidTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    (error_status(&err), Json(ErrorResponse::new(err.to_string())))
}

/// Start a new automation job
///
/// Body: `{"profile_id": "...", "config": <yaml text or object>, "config_path": "..."}`.
/// `config` wins over `config_path`; with neither, server defaults apply.
pub async fn run_job(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<RunResponse>), impl IntoResponse> {
    let body = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Request body must be JSON")),
            ))
        }
    };

    let profile_id = body
        .get("profile_id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let source = ConfigSource::from_request(
        body.get("config").cloned(),
        body.get("config_path")
            .and_then(Value::as_str)
            .map(str::to_string),
    );

    match state.orchestrator().start_job(profile_id, source).await {
        Ok(handle) => Ok((
            StatusCode::ACCEPTED,
            Json(RunResponse {
                job_id: handle.job_id,
                status: JobStatus::Pending,
                status_url: handle.status_url,
            }),
        )),
        Err(e) => {
            warn!("Rejected run request: {}", e);
            Err(error_response(e))
        }
    }
}

/// Get a job by ID
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, impl IntoResponse> {
    state
        .orchestrator()
        .get_status(&job_id)
        .await
        .map(Json)
        .map_err(error_response)
}
