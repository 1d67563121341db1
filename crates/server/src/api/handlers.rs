use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use reelforge_core::{JobCounts, SanitizedConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

const SERVICE_NAME: &str = "reelforge";
const DESCRIPTION: &str = "Product video automation service";

#[derive(Serialize)]
pub struct InfoResponse {
    pub service: String,
    pub version: String,
    pub description: String,
    pub endpoints: BTreeMap<String, String>,
    pub jobs: JobCounts,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let endpoints = [
        ("/", "Service information"),
        ("/health", "Health check"),
        ("/config", "Effective configuration without secrets"),
        ("/metrics", "Prometheus metrics"),
        ("/run", "Start automation job (POST)"),
        ("/status/{job_id}", "Get job status"),
    ]
    .into_iter()
    .map(|(path, what)| (path.to_string(), what.to_string()))
    .collect();

    Json(InfoResponse {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: DESCRIPTION.to_string(),
        endpoints,
        jobs: state.orchestrator().job_counts().await,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found")),
    )
}
