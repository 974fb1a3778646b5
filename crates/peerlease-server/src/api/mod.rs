//! HTTP API Module
//!
//! REST API endpoints for the broker.
//!
//! This module contains:
//! - `state`: Shared application state
//! - `config`: Region listing and lease issuance
//! - `health`: Liveness probe and build metadata
//! - `metrics`: Prometheus metrics endpoint
//! - `error`: Error to response mapping

mod config;
mod error;
mod health;
mod metrics;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{routing::get, Router};

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(health::health_check))
        .route("/version", get(health::version))
        // Observability
        .route("/metrics", get(metrics::get_metrics))
        // Leases
        .route("/config/countries", get(config::list_countries))
        .route("/config/new", get(config::new_config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::directory::{CandidateSource, StaticDirectory, StatsSource};
    use crate::testing::{record, Script, ScriptedClient, UnreachableDirectory, VALID};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app<D>(directory: D, client: &Arc<ScriptedClient>) -> Router
    where
        D: CandidateSource + StatsSource + 'static,
    {
        app_with(BrokerConfig::default(), directory, client)
    }

    fn app_with<D>(config: BrokerConfig, directory: D, client: &Arc<ScriptedClient>) -> Router
    where
        D: CandidateSource + StatsSource + 'static,
    {
        create_router(AppState::new(&config, Arc::new(directory), client.clone()))
    }

    fn nl_nodes() -> StaticDirectory {
        StaticDirectory::new(vec![
            record("10.0.0.1", "NL"),
            record("10.0.0.2", "NL"),
            record("10.0.0.9", "US"),
        ])
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_countries_lists_regions() {
        let client = Arc::new(ScriptedClient::default());
        let response = get(app(nl_nodes(), &client), "/config/countries").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(["NL", "US"]));
    }

    #[tokio::test]
    async fn test_countries_reports_statistics_failure() {
        let client = Arc::new(ScriptedClient::default());
        let response = get(app(UnreachableDirectory, &client), "/config/countries").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "directory unreachable"})
        );
    }

    #[tokio::test]
    async fn test_missing_parameters_are_rejected() {
        let client = Arc::new(ScriptedClient::default());
        let response = get(app(nl_nodes(), &client), "/config/new").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Missing required parameter(s): geo, lease_minutes"})
        );
    }

    #[tokio::test]
    async fn test_undecodable_query_gets_json_error() {
        let client = Arc::new(ScriptedClient::default().with("10.0.0.1", Script::Respond(VALID)));
        let response = get(
            app(nl_nodes(), &client),
            "/config/new?geo=NL&geo=US&lease_minutes=5",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("duplicate field `geo`"), "unexpected error: {error}");
        assert!(client.hosts().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_lease_never_reaches_nodes() {
        let client = Arc::new(ScriptedClient::default().with("10.0.0.1", Script::Respond(VALID)));
        let response = get(app(nl_nodes(), &client), "/config/new?geo=NL&lease_minutes=61").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Lease must be between 0.5 and 60 minutes, you supplied 61"
        );
        assert!(client.hosts().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_region_is_not_found() {
        let client = Arc::new(ScriptedClient::default());
        let response = get(app(nl_nodes(), &client), "/config/new?geo=JP&lease_minutes=5").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"],
            "No nodes found for region: JP"
        );
        assert!(client.hosts().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_candidates_are_not_found() {
        let client = Arc::new(
            ScriptedClient::default()
                .with("10.0.0.1", Script::Respond("{}"))
                .with("10.0.0.2", Script::Refuse),
        );
        let response = get(app(nl_nodes(), &client), "/config/new?geo=NL&lease_minutes=5").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"],
            "No config found for region: NL (2 nodes tried)"
        );
        assert_eq!(client.hosts(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_json_format_returns_both_fields() {
        let client = Arc::new(
            ScriptedClient::default()
                .with("10.0.0.1", Script::Refuse)
                .with("10.0.0.2", Script::Respond(VALID)),
        );
        let response = get(app(nl_nodes(), &client), "/config/new?geo=NL&lease_minutes=5").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "peer_config": "[Interface]\nPrivateKey=abc",
                "expires_at": 1760000000000u64,
            })
        );
    }

    #[tokio::test]
    async fn test_raw_format_returns_only_peer_config() {
        let client = Arc::new(ScriptedClient::default().with("10.0.0.1", Script::Respond(VALID)));
        let response = get(
            app(nl_nodes(), &client),
            "/config/new?geo=NL&lease_minutes=5&format=raw",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_text(response).await, "[Interface]\nPrivateKey=abc");
    }

    #[tokio::test]
    async fn test_disabled_issuance_echoes_inputs() {
        let client = Arc::new(ScriptedClient::default().with("10.0.0.1", Script::Respond(VALID)));
        let config = BrokerConfig {
            issuance_enabled: false,
            ..Default::default()
        };
        let response = get(
            app_with(config, nl_nodes(), &client),
            "/config/new?geo=any&lease_minutes=2.5",
        )
        .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "error": "Endpoint not yet enabled, it will be soon",
                "your_inputs": {"geo": null, "lease_minutes": 2.5},
            })
        );
        assert!(client.hosts().is_empty());
    }

    #[tokio::test]
    async fn test_health_follows_directory() {
        let client = Arc::new(ScriptedClient::default());

        let response = get(app(nl_nodes(), &client), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app(UnreachableDirectory, &client), "/health").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_version_reports_crate_version() {
        let client = Arc::new(ScriptedClient::default());
        let response = get(app(nl_nodes(), &client), "/version").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["version"],
            crate::version::VERSION
        );
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let client = Arc::new(ScriptedClient::default());
        let response = get(app(nl_nodes(), &client), "/metrics").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
