//! Config Broker
//!
//! Runs one lease request end to end: look up candidates for the validated
//! region, hand them to the [`ConfigFetcher`], and turn the outcome into
//! either an issued configuration or a [`BrokerError`].

use crate::directory::CandidateSource;
use crate::fetcher::{ConfigFetcher, FetchOutcome};
use crate::observability;
use peerlease_core::{IssuedConfig, LeaseRequest};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

/// Terminal failures of a lease request
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The directory knows no nodes for the region
    #[error("No nodes found for region: {region}")]
    NoCandidates { region: String },

    /// Nodes exist but none issued a lease
    #[error("No config found for region: {region} ({attempts} nodes tried)")]
    NotFound { region: String, attempts: usize },

    /// The directory could not be read
    #[error("Failed to look up nodes for region {region}: {error:#}")]
    Directory { region: String, error: anyhow::Error },
}

impl BrokerError {
    /// Metric label for this failure
    pub fn kind(&self) -> &'static str {
        match self {
            BrokerError::NoCandidates { .. } => "no_candidates",
            BrokerError::NotFound { .. } => "not_found",
            BrokerError::Directory { .. } => "directory_error",
        }
    }
}

/// Orchestrates candidate lookup and the fan-out
pub struct ConfigBroker {
    candidates: Arc<dyn CandidateSource>,
    fetcher: ConfigFetcher,
}

impl ConfigBroker {
    pub fn new(candidates: Arc<dyn CandidateSource>, fetcher: ConfigFetcher) -> Self {
        Self {
            candidates,
            fetcher,
        }
    }

    /// Obtain a lease for a validated request.
    #[tracing::instrument(
        skip_all,
        fields(request_id = %uuid::Uuid::new_v4(), region = %lease.region_label())
    )]
    pub async fn issue(&self, lease: &LeaseRequest) -> Result<IssuedConfig, BrokerError> {
        let region = lease.region_label();
        observability::lease_requested(
            region,
            lease.lease_minutes,
            lease.timeout.as_millis(),
            &lease.format.to_string(),
        );

        let candidates = self
            .candidates
            .candidates(lease.region.as_deref())
            .await
            .map_err(|error| {
                observability::directory_failed("candidates", &format!("{error:#}"));
                BrokerError::Directory {
                    region: region.to_string(),
                    error,
                }
            })?;

        tracing::info!(candidate_count = candidates.len(), "Got candidates for region");

        if candidates.is_empty() {
            observability::no_candidates(region);
            return Err(BrokerError::NoCandidates {
                region: region.to_string(),
            });
        }

        let started = Instant::now();
        let outcome = self.fetcher.try_candidates(&candidates, lease).await;
        observability::metrics::record_fanout(candidates.len(), started.elapsed());

        match outcome {
            FetchOutcome::Issued { config, .. } => Ok(config),
            FetchOutcome::Exhausted { attempts } => {
                observability::lease_exhausted(region, attempts);
                Err(BrokerError::NotFound {
                    region: region.to_string(),
                    attempts,
                })
            }
        }
    }
}
