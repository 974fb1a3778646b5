//! Region listing
//!
//! Serves the set of regions that currently have registered nodes. The list
//! is derived from the directory's per-region statistics and kept in a
//! [`TtlCache`] so repeated requests within the TTL never touch the directory.

use crate::cache::TtlCache;
use crate::directory::StatsSource;
use crate::observability;
use std::sync::Arc;
use std::time::Duration;

const REGIONS_KEY: &str = "region_stats";

/// TTL-cached view of the regions with live nodes
pub struct RegionCache {
    stats: Arc<dyn StatsSource>,
    store: Arc<TtlCache<Vec<String>>>,
    ttl: Duration,
}

impl RegionCache {
    pub fn new(stats: Arc<dyn StatsSource>, store: Arc<TtlCache<Vec<String>>>, ttl: Duration) -> Self {
        Self { stats, store, ttl }
    }

    /// Sorted region identifiers.
    ///
    /// An empty statistics result is cached like any other.
    pub async fn list_regions(&self) -> anyhow::Result<Vec<String>> {
        if let Some(regions) = self.store.get(REGIONS_KEY).await {
            observability::metrics::record_region_cache_lookup(true);
            return Ok(regions);
        }
        observability::metrics::record_region_cache_lookup(false);

        let stats = self.stats.region_stats().await?;
        let regions: Vec<String> = stats.into_keys().collect();
        self.store.set(REGIONS_KEY, regions.clone(), self.ttl).await;

        observability::regions_refreshed(regions.len(), self.ttl);
        Ok(regions)
    }
}
