//! Candidate node addresses
//!
//! Directories sometimes report IPv4 nodes in their IPv4-mapped IPv6 text
//! form (`::ffff:10.0.0.5`). URLs and logs need the canonical IPv4 text, so
//! every [`Candidate`] is normalized on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

const IPV4_MAPPED_PREFIX: &str = "::ffff:";

/// A node address that may be asked for a lease.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Candidate(String);

impl Candidate {
    /// Normalize a raw address reported by the directory.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(ip) = trimmed.parse::<IpAddr>() {
            return Self(ip.to_canonical().to_string());
        }

        // Not an IP literal (e.g. a hostname), or a mapped form the parser rejects
        let stripped = trimmed
            .get(..IPV4_MAPPED_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(IPV4_MAPPED_PREFIX))
            .map(|_| &trimmed[IPV4_MAPPED_PREFIX.len()..])
            .unwrap_or(trimmed);

        Self(stripped.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host part for a URL: IPv6 literals are bracketed.
    pub fn url_host(&self) -> String {
        match self.0.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{v6}]"),
            _ => self.0.clone(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Candidate {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for Candidate {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Candidate> for String {
    fn from(candidate: Candidate) -> Self {
        candidate.0
    }
}
