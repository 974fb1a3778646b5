//! Node Directory
//!
//! The broker does not discover nodes itself. It reads them from a directory:
//! - `etcd`: nodes registered under `<prefix>/nodes/<ip>` in etcd
//! - `file`: a static JSON list of node records
//!
//! Both backends expose the same two views: an ordered candidate list per
//! region ([`CandidateSource`]) and per-region statistics ([`StatsSource`]).

mod etcd;
mod file;

pub use etcd::EtcdDirectory;
pub use file::StaticDirectory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use peerlease_core::Candidate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// A node as registered in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Address the node's lease service is reachable on
    pub ip: String,
    /// Region (country code) the node serves
    pub region: String,
    /// When the node last refreshed its registration
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    /// Application-specific metadata
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl NodeRecord {
    /// Whether the node refreshed its registration within `stale_after`.
    /// Records without `last_seen`, or a `None` limit, are always live.
    pub fn is_live(&self, stale_after: Option<Duration>, now: DateTime<Utc>) -> bool {
        let (Some(limit), Some(last_seen)) = (stale_after, self.last_seen) else {
            return true;
        };
        match chrono::Duration::from_std(limit) {
            Ok(limit) => now.signed_duration_since(last_seen) <= limit,
            Err(_) => true,
        }
    }
}

/// Aggregate statistics for one region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStats {
    pub node_count: usize,
}

/// Ordered candidate lookup.
///
/// An empty list means "no nodes"; `Err` means the directory could not be read.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Candidates for `region` (`None` = any region), in trial order.
    async fn candidates(&self, region: Option<&str>) -> anyhow::Result<Vec<Candidate>>;

    /// Liveness check of the directory backend.
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Aggregate per-region statistics, keyed by region identifier.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn region_stats(&self) -> anyhow::Result<BTreeMap<String, RegionStats>>;
}

/// Candidates for `region` in record order.
pub(crate) fn select_candidates<'a>(
    records: impl IntoIterator<Item = &'a NodeRecord>,
    region: Option<&str>,
) -> Vec<Candidate> {
    records
        .into_iter()
        .filter(|record| region.map_or(true, |r| record.region == r))
        .map(|record| Candidate::new(&record.ip))
        .collect()
}

/// Node counts grouped by region.
pub(crate) fn aggregate_stats<'a>(
    records: impl IntoIterator<Item = &'a NodeRecord>,
) -> BTreeMap<String, RegionStats> {
    let mut stats: BTreeMap<String, RegionStats> = BTreeMap::new();
    for record in records {
        stats.entry(record.region.clone()).or_default().node_count += 1;
    }
    stats
}
