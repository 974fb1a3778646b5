//! Etcd-backed node directory
//!
//! Nodes register themselves under `<prefix>/nodes/<ip>` with a JSON
//! [`NodeRecord`] value. A prefix get returns keys in ascending order, which
//! gives every lookup a deterministic candidate order.

use super::{aggregate_stats, select_candidates, CandidateSource, NodeRecord, RegionStats, StatsSource};
use crate::config::BrokerConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use chrono::Utc;
use etcd_client::{Client, GetOptions};
use peerlease_core::Candidate;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Directory reading node registrations from etcd
#[derive(Clone)]
pub struct EtcdDirectory {
    client: Client,
    prefix: String,
    stale_after: Option<Duration>,
}

impl EtcdDirectory {
    /// Connect to etcd with exponential backoff
    pub async fn connect(endpoints: &[String], prefix: &str, config: &BrokerConfig) -> Result<Self> {
        let backoff = ExponentialBackoff {
            initial_interval: config.etcd_backoff_initial,
            max_interval: config.etcd_backoff_max,
            max_elapsed_time: Some(config.etcd_backoff_max_elapsed),
            ..Default::default()
        };

        let client = retry(backoff, || async {
            match Client::connect(endpoints, None).await {
                Ok(client) => {
                    debug!("Connected to etcd");
                    Ok(client)
                }
                Err(e) => {
                    warn!(error = %e, "etcd connection failed, retrying");
                    Err(backoff::Error::transient(e))
                }
            }
        })
        .await
        .map_err(|e| anyhow!("Failed to connect to etcd after retries: {:?}", e))?;

        Ok(Self {
            client,
            prefix: prefix.trim_end_matches('/').to_string(),
            stale_after: config.node_stale_after,
        })
    }

    /// Key prefix all node records live under
    pub fn nodes_prefix(&self) -> String {
        format!("{}/nodes/", self.prefix)
    }

    async fn records(&self) -> Result<Vec<NodeRecord>> {
        let prefix = self.nodes_prefix();
        let mut client = self.client.clone();
        let resp = client
            .get(prefix.as_str(), Some(GetOptions::new().with_prefix()))
            .await
            .context("Failed to read node records from etcd")?;

        let now = Utc::now();
        let mut records = Vec::with_capacity(resp.kvs().len());
        for kv in resp.kvs() {
            let key = kv.key_str().unwrap_or("<non-utf8>");
            match serde_json::from_slice::<NodeRecord>(kv.value()) {
                Ok(record) if record.is_live(self.stale_after, now) => records.push(record),
                Ok(_) => {
                    debug!(key = %key, "Skipping stale node record");
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping invalid node record");
                }
            }
        }

        debug!(prefix = %prefix, node_count = records.len(), "Read node records from etcd");
        Ok(records)
    }
}

#[async_trait]
impl CandidateSource for EtcdDirectory {
    async fn candidates(&self, region: Option<&str>) -> Result<Vec<Candidate>> {
        let records = self.records().await?;
        Ok(select_candidates(&records, region))
    }

    async fn ping(&self) -> Result<()> {
        let mut client = self.client.clone();
        client.status().await.context("etcd status check failed")?;
        Ok(())
    }
}

#[async_trait]
impl StatsSource for EtcdDirectory {
    async fn region_stats(&self) -> Result<BTreeMap<String, RegionStats>> {
        let records = self.records().await?;
        Ok(aggregate_stats(&records))
    }
}
