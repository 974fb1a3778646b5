//! Lease request model and validation
//!
//! Raw query parameters arrive as [`LeaseQuery`] and are turned into a
//! [`LeaseRequest`] by [`LeaseQuery::validate`]. Validation is pure: it never
//! touches the network, so a rejected request can never reach a node.

use crate::error::LeaseRequestError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};

/// Shortest lease a node may be asked for, in minutes.
pub const LEASE_MIN_MINUTES: f64 = 0.5;

/// Longest lease a node may be asked for, in minutes.
pub const LEASE_MAX_MINUTES: f64 = 60.0;

/// Region value that means "no region constraint".
pub const ANY_REGION: &str = "any";

/// Region text sent to nodes when no region filter applies.
pub const NO_REGION_WIRE: &str = "null";

/// Response body format requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaseFormat {
    /// `{peer_config, expires_at}` as JSON
    #[default]
    Json,
    /// Bare `peer_config` text
    Raw,
}

/// Query parameters of `GET /config/new`, exactly as the client sent them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LeaseQuery {
    pub geo: Option<String>,
    pub lease_minutes: Option<String>,
    pub format: Option<String>,
    pub timeout_ms: Option<String>,
}

/// Server-side defaults applied while validating a query.
#[derive(Debug, Clone, Copy)]
pub struct LeaseDefaults {
    /// Per-attempt deadline when the client does not pass `timeout_ms`
    pub timeout: Duration,
    /// Largest `timeout_ms` a client may ask for
    pub max_timeout: Duration,
}

impl Default for LeaseDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            max_timeout: Duration::from_millis(60_000),
        }
    }
}

/// A validated lease request.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaseRequest {
    /// Region filter; `None` means any node may serve the lease
    pub region: Option<String>,
    pub lease_minutes: f64,
    /// Deadline for each individual node attempt
    pub timeout: Duration,
    pub format: LeaseFormat,
}

impl LeaseRequest {
    /// Region name for messages and logs.
    pub fn region_label(&self) -> &str {
        self.region.as_deref().unwrap_or(ANY_REGION)
    }

    /// Region text embedded in the node URL.
    pub fn wire_region(&self) -> &str {
        self.region.as_deref().unwrap_or(NO_REGION_WIRE)
    }
}

/// Rewrite the `any` wildcard to "no filter".
pub fn normalize_region(geo: &str) -> Option<String> {
    if geo == ANY_REGION {
        None
    } else {
        Some(geo.to_string())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl LeaseQuery {
    /// Validate the raw parameters and produce a [`LeaseRequest`].
    pub fn validate(&self, defaults: &LeaseDefaults) -> Result<LeaseRequest, LeaseRequestError> {
        let geo = present(&self.geo);
        let lease_minutes = present(&self.lease_minutes);

        let (geo, lease_minutes) = match (geo, lease_minutes) {
            (Some(geo), Some(minutes)) => (geo, minutes),
            (geo, minutes) => {
                let mut fields = Vec::new();
                if geo.is_none() {
                    fields.push("geo");
                }
                if minutes.is_none() {
                    fields.push("lease_minutes");
                }
                return Err(LeaseRequestError::MissingParameter { fields });
            }
        };

        let minutes = f64::from_str(lease_minutes.trim()).map_err(|_| {
            LeaseRequestError::InvalidParameter {
                field: "lease_minutes",
                supplied: lease_minutes.to_string(),
            }
        })?;

        // NaN fails `contains` as well
        if !(LEASE_MIN_MINUTES..=LEASE_MAX_MINUTES).contains(&minutes) {
            return Err(LeaseRequestError::InvalidRange {
                supplied: lease_minutes.to_string(),
                min: LEASE_MIN_MINUTES,
                max: LEASE_MAX_MINUTES,
            });
        }

        let format = match present(&self.format) {
            Some(format) => LeaseFormat::from_str(format).map_err(|_| {
                LeaseRequestError::InvalidParameter {
                    field: "format",
                    supplied: format.to_string(),
                }
            })?,
            None => LeaseFormat::default(),
        };

        let timeout = match present(&self.timeout_ms) {
            Some(raw) => parse_timeout(raw, defaults.max_timeout)?,
            None => defaults.timeout,
        };

        Ok(LeaseRequest {
            region: normalize_region(geo),
            lease_minutes: minutes,
            timeout,
            format,
        })
    }
}

fn parse_timeout(raw: &str, max: Duration) -> Result<Duration, LeaseRequestError> {
    let invalid = || LeaseRequestError::InvalidParameter {
        field: "timeout_ms",
        supplied: raw.to_string(),
    };

    let millis = u64::from_str(raw.trim()).map_err(|_| invalid())?;
    let timeout = Duration::from_millis(millis);
    if millis == 0 || timeout > max {
        return Err(invalid());
    }
    Ok(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(geo: Option<&str>, minutes: Option<&str>) -> LeaseQuery {
        LeaseQuery {
            geo: geo.map(String::from),
            lease_minutes: minutes.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request_with_defaults() {
        let request = query(Some("NL"), Some("5"))
            .validate(&LeaseDefaults::default())
            .unwrap();

        assert_eq!(request.region.as_deref(), Some("NL"));
        assert_eq!(request.lease_minutes, 5.0);
        assert_eq!(request.timeout, Duration::from_millis(5_000));
        assert_eq!(request.format, LeaseFormat::Json);
    }

    #[test]
    fn test_any_region_becomes_no_filter() {
        let request = query(Some("any"), Some("1"))
            .validate(&LeaseDefaults::default())
            .unwrap();

        assert!(request.region.is_none());
        assert_eq!(request.region_label(), "any");
        assert_eq!(request.wire_region(), "null");
    }

    #[test]
    fn test_other_regions_pass_through_unchanged() {
        for geo in ["US", "ANY", "Any", "de", "any "] {
            let request = query(Some(geo), Some("1"))
                .validate(&LeaseDefaults::default())
                .unwrap();
            assert_eq!(request.region.as_deref(), Some(geo));
        }
    }

    #[test]
    fn test_missing_fields_are_all_named() {
        let err = query(None, None)
            .validate(&LeaseDefaults::default())
            .unwrap_err();
        assert_eq!(
            err,
            LeaseRequestError::MissingParameter {
                fields: vec!["geo", "lease_minutes"]
            }
        );

        let err = query(Some("NL"), Some(""))
            .validate(&LeaseDefaults::default())
            .unwrap_err();
        assert_eq!(
            err,
            LeaseRequestError::MissingParameter {
                fields: vec!["lease_minutes"]
            }
        );
    }

    #[test]
    fn test_lease_bounds_are_inclusive() {
        for minutes in ["0.5", "60", "30"] {
            assert!(query(Some("NL"), Some(minutes))
                .validate(&LeaseDefaults::default())
                .is_ok());
        }
    }

    #[test]
    fn test_out_of_range_lease_is_rejected() {
        for minutes in ["0.49", "0", "-1", "60.01", "1000", "NaN", "inf"] {
            let err = query(Some("NL"), Some(minutes))
                .validate(&LeaseDefaults::default())
                .unwrap_err();
            assert!(
                matches!(err, LeaseRequestError::InvalidRange { ref supplied, .. } if supplied == minutes),
                "expected InvalidRange for {minutes}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_non_numeric_lease_is_rejected() {
        let err = query(Some("NL"), Some("ten"))
            .validate(&LeaseDefaults::default())
            .unwrap_err();
        assert_eq!(
            err,
            LeaseRequestError::InvalidParameter {
                field: "lease_minutes",
                supplied: "ten".to_string()
            }
        );
    }

    #[test]
    fn test_format_parsing() {
        let mut q = query(Some("NL"), Some("1"));
        q.format = Some("raw".to_string());
        assert_eq!(
            q.validate(&LeaseDefaults::default()).unwrap().format,
            LeaseFormat::Raw
        );

        q.format = Some("yaml".to_string());
        assert!(matches!(
            q.validate(&LeaseDefaults::default()),
            Err(LeaseRequestError::InvalidParameter { field: "format", .. })
        ));
    }

    #[test]
    fn test_timeout_override_and_limits() {
        let defaults = LeaseDefaults::default();
        let mut q = query(Some("NL"), Some("1"));

        q.timeout_ms = Some("250".to_string());
        assert_eq!(
            q.validate(&defaults).unwrap().timeout,
            Duration::from_millis(250)
        );

        for bad in ["0", "-5", "abc", "60001"] {
            q.timeout_ms = Some(bad.to_string());
            assert!(
                matches!(
                    q.validate(&defaults),
                    Err(LeaseRequestError::InvalidParameter { field: "timeout_ms", .. })
                ),
                "expected rejection for timeout_ms={bad}"
            );
        }
    }
}
