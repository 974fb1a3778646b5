//! Structured Events
//!
//! Structured event logging with consistent fields across the broker. Each
//! event type has a dedicated function so field names stay identical wherever
//! the event is emitted.
//!
//! Event types:
//! - `lease_requested` - A validated lease request entered the broker
//! - `lease_rejected` - Client input failed validation
//! - `no_candidates` - The directory has no nodes for the region
//! - `lease_attempt_failed` - One node attempt failed (transport, timeout, parse)
//! - `lease_declined` - A node answered without issuing a lease
//! - `lease_issued` - A node issued a lease
//! - `lease_exhausted` - Every candidate failed or declined
//! - `regions_refreshed` - The region list was recomputed from statistics
//! - `directory_failed` - The directory could not be read

use std::time::Duration;
use tracing::{error, info};

/// Upper bound on how much of a node's body is logged
const MAX_LOGGED_BODY: usize = 2048;

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BODY {
        return body;
    }
    let mut end = MAX_LOGGED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Emit a lease requested event
pub fn lease_requested(region: &str, lease_minutes: f64, timeout_ms: u128, format: &str) {
    info!(
        event_type = "lease_requested",
        region = %region,
        lease_minutes = lease_minutes,
        timeout_ms = timeout_ms as u64,
        format = %format,
        "Lease requested"
    );
}

/// Emit a lease rejected event. Client errors are not system faults.
pub fn lease_rejected(reason: &str) {
    info!(
        event_type = "lease_rejected",
        reason = %reason,
        "Lease request rejected"
    );
}

/// Emit a no candidates event
pub fn no_candidates(region: &str) {
    info!(
        event_type = "no_candidates",
        region = %region,
        "No nodes registered for region"
    );
}

/// Emit a lease attempt failed event
pub fn lease_attempt_failed(attempt: usize, candidate: &str, error: &str, body: Option<&str>) {
    info!(
        event_type = "lease_attempt_failed",
        attempt = attempt,
        candidate = %candidate,
        error = %error,
        body = body.map(truncate),
        "Error requesting config from node"
    );
}

/// Emit a lease declined event
pub fn lease_declined(candidate: &str, status: u16, body: &str) {
    info!(
        event_type = "lease_declined",
        candidate = %candidate,
        status = status,
        body = %truncate(body),
        "Node did not issue a lease"
    );
}

/// Emit a lease issued event
pub fn lease_issued(region: &str, candidate: &str, attempts: usize) {
    info!(
        event_type = "lease_issued",
        region = %region,
        candidate = %candidate,
        attempts = attempts,
        "Lease issued"
    );
}

/// Emit a lease exhausted event
pub fn lease_exhausted(region: &str, attempts: usize) {
    info!(
        event_type = "lease_exhausted",
        region = %region,
        attempts = attempts,
        "No node issued a lease"
    );
}

/// Emit a regions refreshed event
pub fn regions_refreshed(region_count: usize, ttl: Duration) {
    info!(
        event_type = "regions_refreshed",
        region_count = region_count,
        ttl_ms = ttl.as_millis() as u64,
        "Region list refreshed"
    );
}

/// Emit a directory failed event
pub fn directory_failed(operation: &str, error: &str) {
    error!(
        event_type = "directory_failed",
        operation = %operation,
        error = %error,
        "Directory read failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_functions_dont_panic() {
        lease_requested("NL", 5.0, 5000, "json");
        lease_rejected("Missing required parameter(s): geo");
        no_candidates("any");
        lease_attempt_failed(1, "10.0.0.1", "timed out after 5000 ms", None);
        lease_attempt_failed(2, "10.0.0.2", "unparseable response body", Some("<html>"));
        lease_declined("10.0.0.3", 200, "{}");
        lease_issued("NL", "10.0.0.4", 4);
        lease_exhausted("NL", 3);
        regions_refreshed(12, Duration::from_secs(60));
        directory_failed("candidates", "connection refused");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_LOGGED_BODY);
        let cut = truncate(&body);
        assert!(cut.len() <= MAX_LOGGED_BODY);
        assert!(cut.chars().all(|c| c == 'é'));
        assert_eq!(truncate("short"), "short");
    }
}
