//! Configurations issued by nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Expiry reported by a node, passed through to the client verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpiresAt {
    /// Epoch timestamp, typically milliseconds
    Epoch(serde_json::Number),
    /// Textual timestamp
    Text(String),
}

impl ExpiresAt {
    /// `0` and `""` carry no expiry.
    pub fn is_present(&self) -> bool {
        match self {
            ExpiresAt::Epoch(n) => n.as_f64().is_some_and(|v| v != 0.0),
            ExpiresAt::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for ExpiresAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiresAt::Epoch(n) => write!(f, "{n}"),
            ExpiresAt::Text(s) => f.write_str(s),
        }
    }
}

/// Body of a node's `/wireguard/new` response. Both fields are optional on
/// the wire; a node that cannot issue a lease omits them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeLeaseResponse {
    #[serde(default)]
    pub peer_config: Option<String>,
    #[serde(default)]
    pub expires_at: Option<ExpiresAt>,
}

/// A usable lease: peer configuration plus its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedConfig {
    pub peer_config: String,
    pub expires_at: ExpiresAt,
}

impl IssuedConfig {
    /// Accept a node response only when both fields are present and non-empty.
    pub fn from_response(response: NodeLeaseResponse) -> Option<Self> {
        let peer_config = response.peer_config.filter(|c| !c.is_empty())?;
        let expires_at = response.expires_at.filter(ExpiresAt::is_present)?;
        Some(Self {
            peer_config,
            expires_at,
        })
    }
}
