//! Health Check Endpoint
//!
//! Liveness probe and build metadata handlers.

use super::state::AppState;
use crate::version::BuildInfo;
use axum::{extract::State, http::StatusCode, Json};

/// Liveness probe endpoint. Verifies the node directory is reachable.
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    let directory_check = tokio::time::timeout(state.health_check_timeout, state.directory.ping()).await;

    match directory_check {
        Ok(Ok(())) => Ok("OK"),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "directory health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(_) => {
            tracing::warn!("directory health check timed out");
            Err(StatusCode::REQUEST_TIMEOUT)
        }
    }
}

/// GET /version - Build metadata
pub async fn version() -> Json<BuildInfo> {
    Json(BuildInfo::current())
}
