//! Static node directory
//!
//! Node records held in memory, loaded from a JSON array file. Used when no
//! etcd cluster is available.

use super::{aggregate_stats, select_candidates, CandidateSource, NodeRecord, RegionStats, StatsSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use peerlease_core::Candidate;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// In-memory directory over a fixed list of node records
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: Arc<Vec<NodeRecord>>,
    stale_after: Option<Duration>,
}

impl StaticDirectory {
    pub fn new(records: Vec<NodeRecord>) -> Self {
        Self {
            records: Arc::new(records),
            stale_after: None,
        }
    }

    /// Load a JSON array of node records.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read nodes file {}", path.display()))?;
        let records: Vec<NodeRecord> = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse nodes file {}", path.display()))?;
        Ok(Self::new(records))
    }

    /// Ignore records whose `last_seen` is older than `stale_after`.
    pub fn with_stale_after(mut self, stale_after: Option<Duration>) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn node_count(&self) -> usize {
        self.records.len()
    }

    fn live(&self) -> impl Iterator<Item = &NodeRecord> {
        let now = Utc::now();
        let stale_after = self.stale_after;
        self.records
            .iter()
            .filter(move |record| record.is_live(stale_after, now))
    }
}

#[async_trait]
impl CandidateSource for StaticDirectory {
    async fn candidates(&self, region: Option<&str>) -> Result<Vec<Candidate>> {
        Ok(select_candidates(self.live(), region))
    }
}

#[async_trait]
impl StatsSource for StaticDirectory {
    async fn region_stats(&self) -> Result<BTreeMap<String, RegionStats>> {
        Ok(aggregate_stats(self.live()))
    }
}
