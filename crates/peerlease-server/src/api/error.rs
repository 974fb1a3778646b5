//! API Errors
//!
//! Maps broker and validation failures onto HTTP responses with a
//! `{"error": message}` body.

use crate::broker::BrokerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use peerlease_core::LeaseRequestError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidRequest(#[from] LeaseRequestError),

    /// Query string that could not be decoded at all
    #[error("{0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Broker(BrokerError::NoCandidates { .. } | BrokerError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Broker(BrokerError::Directory { .. }) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
