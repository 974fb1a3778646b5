//! Test doubles shared by the unit tests

use crate::directory::{CandidateSource, NodeRecord, RegionStats, StaticDirectory, StatsSource};
use crate::fetcher::{BodyTooLarge, NodeClient, NodeReply};
use async_trait::async_trait;
use peerlease_core::Candidate;
use reqwest::Url;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A complete lease response
pub const VALID: &str = r#"{"peer_config":"[Interface]\nPrivateKey=abc","expires_at":1760000000000}"#;

/// What a scripted node does when asked for a lease
#[derive(Clone)]
pub enum Script {
    Respond(&'static str),
    Hang,
    Refuse,
    TooLarge,
}

/// Node client that replays per-host scripts and records every URL hit
#[derive(Default)]
pub struct ScriptedClient {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedClient {
    pub fn with(mut self, host: &str, script: Script) -> Self {
        self.scripts.insert(host.to_string(), script);
        self
    }

    /// Hosts contacted, in call order
    pub fn hosts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|url| url.host_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(Url::to_string).collect()
    }
}

#[async_trait]
impl NodeClient for ScriptedClient {
    async fn get(&self, url: &Url) -> anyhow::Result<NodeReply> {
        self.calls.lock().unwrap().push(url.clone());
        let host = url.host_str().unwrap_or_default().to_string();
        match self.scripts.get(&host).cloned() {
            Some(Script::Respond(body)) => Ok(NodeReply {
                status: 200,
                body: body.to_string(),
            }),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::TooLarge) => Err(BodyTooLarge { limit: 16 }.into()),
            Some(Script::Refuse) | None => anyhow::bail!("connection refused"),
        }
    }
}

/// Static directory that counts how often each view is read
#[derive(Default)]
pub struct CountingDirectory {
    inner: StaticDirectory,
    lookups: AtomicUsize,
    stats_reads: AtomicUsize,
}

impl CountingDirectory {
    pub fn new(records: Vec<NodeRecord>) -> Self {
        Self {
            inner: StaticDirectory::new(records),
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn stats_reads(&self) -> usize {
        self.stats_reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CandidateSource for CountingDirectory {
    async fn candidates(&self, region: Option<&str>) -> anyhow::Result<Vec<Candidate>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.candidates(region).await
    }
}

#[async_trait]
impl StatsSource for CountingDirectory {
    async fn region_stats(&self) -> anyhow::Result<BTreeMap<String, RegionStats>> {
        self.stats_reads.fetch_add(1, Ordering::Relaxed);
        self.inner.region_stats().await
    }
}

/// Directory whose backend is unreachable
pub struct UnreachableDirectory;

#[async_trait]
impl CandidateSource for UnreachableDirectory {
    async fn candidates(&self, _region: Option<&str>) -> anyhow::Result<Vec<Candidate>> {
        anyhow::bail!("directory unreachable")
    }

    async fn ping(&self) -> anyhow::Result<()> {
        anyhow::bail!("directory unreachable")
    }
}

#[async_trait]
impl StatsSource for UnreachableDirectory {
    async fn region_stats(&self) -> anyhow::Result<BTreeMap<String, RegionStats>> {
        anyhow::bail!("directory unreachable")
    }
}

pub fn record(ip: &str, region: &str) -> NodeRecord {
    NodeRecord {
        ip: ip.to_string(),
        region: region.to_string(),
        last_seen: None,
        meta: HashMap::new(),
    }
}
