use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub server: String,
    pub server_id: String,
    pub sessions: usize,
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: &'static str,
    pub build_time: u64,
    pub git_branch: &'static str,
    pub git_commit: &'static str,
}

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.metrics.format_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {}", e)).into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let identity = state.catalog.identity();
    Json(Health {
        status: "ok",
        server: identity.name,
        server_id: identity.id,
        sessions: state.registry.len(),
        uptime: state.start_time.elapsed().as_millis() as u64,
    })
}

/// GET /version
pub async fn get_version() -> Json<VersionInfo> {
    tracing::debug!("GET /version");
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_time: option_env!("BUILD_TIME")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        git_branch: option_env!("GIT_BRANCH").unwrap_or("unknown"),
        git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown"),
    })
}
