//! Broker Configuration
//!
//! Resolved settings for the broker. Values come from CLI flags with
//! environment fallbacks (see `main.rs`); [`BrokerConfig::default`] carries the
//! same defaults for tests and embedding.

use peerlease_core::LeaseDefaults;
use std::path::PathBuf;
use std::time::Duration;

/// Where candidate nodes and region statistics are read from
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorySource {
    /// etcd cluster (env: ETCD_ENDPOINTS, comma-separated)
    Etcd {
        endpoints: Vec<String>,
        /// Key prefix under which nodes are registered (env: DIRECTORY_PREFIX)
        prefix: String,
    },
    /// JSON file of node records (env: NODES_FILE)
    File(PathBuf),
}

/// Broker configuration with sensible defaults
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// HTTP listen address (env: BIND_ADDR)
    pub bind_addr: String,

    pub directory: DirectorySource,

    // Node wire contract
    /// Port every node serves `/wireguard/new` on (env: NODE_PORT)
    pub node_port: u16,

    /// Skip nodes whose `last_seen` is older than this (env: NODE_STALE_AFTER_SECS)
    pub node_stale_after: Option<Duration>,

    // Lease request handling
    /// Per-attempt deadline when the client omits `timeout_ms` (env: DEFAULT_TIMEOUT_MS)
    pub default_timeout: Duration,

    /// Largest `timeout_ms` a client may request (env: MAX_TIMEOUT_MS)
    pub max_timeout: Duration,

    /// When false, `/config/new` validates input but issues nothing (env: ISSUANCE_ENABLED)
    pub issuance_enabled: bool,

    // Region cache
    /// Lifetime of the cached region list (env: REGION_CACHE_TTL_MS)
    pub region_cache_ttl: Duration,

    // Health
    /// Deadline for the directory check behind `/health`
    pub health_check_timeout: Duration,

    // Directory connection backoff
    /// Initial interval for etcd connection retry
    pub etcd_backoff_initial: Duration,

    /// Maximum interval for etcd connection retry
    pub etcd_backoff_max: Duration,

    /// Maximum elapsed time for etcd connection retries
    pub etcd_backoff_max_elapsed: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            directory: DirectorySource::Etcd {
                endpoints: vec!["http://127.0.0.1:2379".to_string()],
                prefix: "/peerlease".to_string(),
            },
            node_port: 3001,
            node_stale_after: None,
            default_timeout: Duration::from_millis(5_000),
            max_timeout: Duration::from_millis(60_000),
            issuance_enabled: true,
            region_cache_ttl: Duration::from_millis(60_000),
            health_check_timeout: Duration::from_secs(2),
            etcd_backoff_initial: Duration::from_secs(1),
            etcd_backoff_max: Duration::from_secs(10),
            etcd_backoff_max_elapsed: Duration::from_secs(60),
        }
    }
}

impl BrokerConfig {
    /// Defaults applied to every lease query.
    pub fn lease_defaults(&self) -> LeaseDefaults {
        LeaseDefaults {
            timeout: self.default_timeout,
            max_timeout: self.max_timeout,
        }
    }
}
