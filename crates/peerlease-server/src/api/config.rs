//! Config Endpoints
//!
//! - GET /config/countries - regions that currently have nodes
//! - GET /config/new - obtain a peer configuration from a node in a region

use super::error::ApiError;
use super::state::AppState;
use crate::observability;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use peerlease_core::{LeaseFormat, LeaseQuery};
use serde_json::json;

/// GET /config/countries - List regions with registered nodes
#[tracing::instrument(skip(state))]
pub async fn list_countries(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    match state.regions.list_regions().await {
        Ok(regions) => Ok(Json(regions)),
        Err(e) => {
            observability::directory_failed("region_stats", &format!("{e:#}"));
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

/// GET /config/new - Obtain a new peer configuration
///
/// Validates the query, then asks candidate nodes for a lease. Responds with
/// `{peer_config, expires_at}` for `format=json` (default) or the bare
/// `peer_config` for `format=raw`.
#[tracing::instrument(skip(state))]
pub async fn new_config(
    State(state): State<AppState>,
    query: Result<Query<LeaseQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let lease = query
        .map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))
        .and_then(|Query(query)| Ok(query.validate(&state.lease_defaults)?))
        .map_err(|e| {
            observability::lease_rejected(&e.to_string());
            observability::metrics::record_request("rejected");
            e
        })?;

    if !state.issuance_enabled {
        return Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "Endpoint not yet enabled, it will be soon",
                "your_inputs": {
                    "geo": lease.region,
                    "lease_minutes": lease.lease_minutes,
                },
            })),
        )
            .into_response());
    }

    let config = state.broker.issue(&lease).await.map_err(|e| {
        observability::metrics::record_request(e.kind());
        e
    })?;
    observability::metrics::record_request("issued");

    let response = match lease.format {
        LeaseFormat::Json => Json(config).into_response(),
        LeaseFormat::Raw => config.peer_config.into_response(),
    };
    Ok(response)
}
