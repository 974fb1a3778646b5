//! Observability Module
//!
//! Logging, tracing and metrics for the broker:
//! - `metrics`: Prometheus metrics for lease requests, node attempts and the region cache
//! - `events`: Structured event logging with consistent fields
//! - `tracing`: Subscriber setup with optional OpenTelemetry export

pub mod events;
pub mod metrics;
pub mod tracing;

pub use events::*;
pub use self::metrics::{init_metrics, MetricsState};
pub use self::tracing::{init_tracing, shutdown_tracing, TracingConfig};
