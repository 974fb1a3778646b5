//! Config Fetcher
//!
//! Asks candidate nodes for a lease one at a time, in directory order, and
//! returns the first complete configuration. Every per-node failure (transport
//! error, timeout, unparseable body, or a node that declines) is logged and
//! absorbed; the loop only ends on the first success or when the candidates
//! run out.
//!
//! Each attempt is bounded by the request's `timeout`. On expiry the in-flight
//! request future is dropped, which aborts the call and releases its
//! connection. Bodies larger than [`MAX_NODE_BODY`] are abandoned unread and
//! count as malformed.

use crate::observability;
use async_trait::async_trait;
use peerlease_core::{Candidate, IssuedConfig, LeaseRequest, NodeLeaseResponse};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Path of the lease-issuing endpoint on every node
pub const LEASE_PATH: &str = "/wireguard/new";

/// Largest node response body read into memory
pub const MAX_NODE_BODY: usize = 64 * 1024;

/// Raw reply from a node
#[derive(Debug, Clone)]
pub struct NodeReply {
    pub status: u16,
    pub body: String,
}

/// Transport used to reach nodes.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn get(&self, url: &Url) -> anyhow::Result<NodeReply>;
}

/// A node sent more than the client is willing to buffer
#[derive(Debug, Error)]
#[error("response body exceeds {limit} bytes")]
pub struct BodyTooLarge {
    pub limit: usize,
}

/// Plain HTTP node client
#[derive(Clone)]
pub struct HttpNodeClient {
    client: reqwest::Client,
    max_body: usize,
}

impl HttpNodeClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("peerlease/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            max_body: MAX_NODE_BODY,
        })
    }

    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get(&self, url: &Url) -> anyhow::Result<NodeReply> {
        let too_large = || BodyTooLarge {
            limit: self.max_body,
        };

        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body as u64)
        {
            return Err(too_large().into());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_body {
                return Err(too_large().into());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(NodeReply {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Why a single attempt produced nothing usable
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("invalid node url: {0}")]
    Url(String),

    #[error("request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("unparseable response body: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("unparseable response body: {0}")]
    Oversized(BodyTooLarge),
}

impl AttemptError {
    /// Metric label for this failure
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Url(_) => "url",
            AttemptError::Transport(_) => "transport",
            AttemptError::Timeout(_) => "timeout",
            AttemptError::Malformed { .. } | AttemptError::Oversized(_) => "malformed",
        }
    }

    /// Response body read before the failure, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            AttemptError::Malformed { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result of trying a candidate list
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A node issued a lease; `attempts` counts the winning attempt
    Issued {
        config: IssuedConfig,
        candidate: Candidate,
        attempts: usize,
    },
    /// Every candidate failed or declined
    Exhausted { attempts: usize },
}

/// Sequential, first-success-wins lease fetcher
#[derive(Clone)]
pub struct ConfigFetcher {
    client: Arc<dyn NodeClient>,
    node_port: u16,
}

impl ConfigFetcher {
    pub fn new(client: Arc<dyn NodeClient>, node_port: u16) -> Self {
        Self { client, node_port }
    }

    /// Lease URL for `candidate`. A missing region is sent as its textual
    /// form (`null`), which is what nodes expect.
    pub fn lease_url(&self, candidate: &Candidate, lease: &LeaseRequest) -> Result<Url, AttemptError> {
        let base = format!("http://{}:{}{}", candidate.url_host(), self.node_port, LEASE_PATH);
        Url::parse_with_params(
            &base,
            &[
                ("lease_minutes", lease.lease_minutes.to_string()),
                ("geo", lease.wire_region().to_string()),
            ],
        )
        .map_err(|e| AttemptError::Url(format!("{base}: {e}")))
    }

    /// Try `candidates` in order until one issues a lease.
    pub async fn try_candidates(&self, candidates: &[Candidate], lease: &LeaseRequest) -> FetchOutcome {
        for (index, candidate) in candidates.iter().enumerate() {
            let attempt = index + 1;

            match self.attempt(candidate, lease).await {
                Ok(Some(config)) => {
                    observability::metrics::record_attempt("issued");
                    observability::lease_issued(lease.region_label(), candidate.as_str(), attempt);
                    return FetchOutcome::Issued {
                        config,
                        candidate: candidate.clone(),
                        attempts: attempt,
                    };
                }
                Ok(None) => {
                    observability::metrics::record_attempt("declined");
                }
                Err(e) => {
                    observability::metrics::record_attempt(e.kind());
                    observability::lease_attempt_failed(attempt, candidate.as_str(), &e.to_string(), e.body());
                }
            }
        }

        FetchOutcome::Exhausted {
            attempts: candidates.len(),
        }
    }

    /// One bounded request to one node. `Ok(None)` means the node answered
    /// but did not issue a lease.
    async fn attempt(&self, candidate: &Candidate, lease: &LeaseRequest) -> Result<Option<IssuedConfig>, AttemptError> {
        let url = self.lease_url(candidate, lease)?;
        tracing::info!(candidate = %candidate, url = %url, "Requesting config from node");

        let reply = tokio::time::timeout(lease.timeout, self.client.get(&url))
            .await
            .map_err(|_| AttemptError::Timeout(lease.timeout))?
            .map_err(|e| match e.downcast::<BodyTooLarge>() {
                Ok(too_large) => AttemptError::Oversized(too_large),
                Err(e) => AttemptError::Transport(e),
            })?;

        let response: NodeLeaseResponse = serde_json::from_str(&reply.body).map_err(|source| {
            AttemptError::Malformed {
                source,
                body: reply.body.clone(),
            }
        })?;

        let issued = IssuedConfig::from_response(response);
        if issued.is_none() {
            observability::lease_declined(candidate.as_str(), reply.status, &reply.body);
        }
        Ok(issued)
    }
}
