//! Core shared types and validation for peerlease
//!
//! This crate contains the lease request model, candidate address
//! normalization and the configuration type issued by nodes. It has no I/O
//! and is shared by the server and its tests.

pub mod candidate;
pub mod error;
pub mod issued;
pub mod lease;

pub use candidate::Candidate;
pub use error::LeaseRequestError;
pub use issued::{ExpiresAt, IssuedConfig, NodeLeaseResponse};
pub use lease::{LeaseDefaults, LeaseFormat, LeaseQuery, LeaseRequest};
