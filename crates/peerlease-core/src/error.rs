//! Client input errors

use thiserror::Error;

/// Why a lease request was rejected before any node was contacted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeaseRequestError {
    #[error("Missing required parameter(s): {}", .fields.join(", "))]
    MissingParameter { fields: Vec<&'static str> },

    #[error("Lease must be between {min} and {max} minutes, you supplied {supplied}")]
    InvalidRange {
        supplied: String,
        min: f64,
        max: f64,
    },

    #[error("Invalid value for {field}: {supplied}")]
    InvalidParameter {
        field: &'static str,
        supplied: String,
    },
}
