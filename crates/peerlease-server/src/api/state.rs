//! Application State
//!
//! Shared state passed to all API handlers.

use crate::broker::ConfigBroker;
use crate::cache::TtlCache;
use crate::config::BrokerConfig;
use crate::directory::{CandidateSource, StatsSource};
use crate::fetcher::{ConfigFetcher, NodeClient};
use crate::observability::MetricsState;
use crate::regions::RegionCache;
use peerlease_core::LeaseDefaults;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<ConfigBroker>,
    pub regions: Arc<RegionCache>,
    pub directory: Arc<dyn CandidateSource>,
    pub lease_defaults: LeaseDefaults,
    pub issuance_enabled: bool,
    pub health_check_timeout: Duration,
    pub metrics_state: Option<MetricsState>,
}

impl AppState {
    /// Wire the broker and region cache over one directory.
    pub fn new<D>(config: &BrokerConfig, directory: Arc<D>, client: Arc<dyn NodeClient>) -> Self
    where
        D: CandidateSource + StatsSource + 'static,
    {
        let fetcher = ConfigFetcher::new(client, config.node_port);
        let broker = ConfigBroker::new(directory.clone(), fetcher);
        let regions = RegionCache::new(
            directory.clone(),
            Arc::new(TtlCache::new()),
            config.region_cache_ttl,
        );

        Self {
            broker: Arc::new(broker),
            regions: Arc::new(regions),
            directory,
            lease_defaults: config.lease_defaults(),
            issuance_enabled: config.issuance_enabled,
            health_check_timeout: config.health_check_timeout,
            metrics_state: None,
        }
    }

    pub fn with_metrics(mut self, metrics_state: MetricsState) -> Self {
        self.metrics_state = Some(metrics_state);
        self
    }
}
