//! Peerlease Server - regional peer configuration broker

use anyhow::Context;
use clap::Parser;
use peerlease_server::{
    api::{self, AppState},
    config::{BrokerConfig, DirectorySource},
    directory::{EtcdDirectory, StaticDirectory},
    fetcher::{HttpNodeClient, NodeClient},
    observability::{init_metrics, init_tracing, shutdown_tracing, TracingConfig},
    version::BuildInfo,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "peerlease-server")]
#[command(about = "Obtains peer configurations from regional nodes on behalf of clients")]
#[command(version)]
struct Cli {
    /// HTTP listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: String,

    /// etcd endpoints (comma-separated)
    #[arg(
        long,
        env = "ETCD_ENDPOINTS",
        default_value = "http://127.0.0.1:2379",
        value_delimiter = ','
    )]
    etcd_endpoints: Vec<String>,

    /// Key prefix under which nodes register
    #[arg(long, env = "DIRECTORY_PREFIX", default_value = "/peerlease")]
    directory_prefix: String,

    /// Read node records from a JSON file instead of etcd
    #[arg(long, env = "NODES_FILE")]
    nodes_file: Option<PathBuf>,

    /// Port nodes serve lease requests on
    #[arg(long, env = "NODE_PORT", default_value_t = 3001)]
    node_port: u16,

    /// Skip nodes that have not refreshed their registration for this long
    #[arg(long, env = "NODE_STALE_AFTER_SECS")]
    node_stale_after_secs: Option<u64>,

    /// Per-attempt deadline when the client gives none
    #[arg(long, env = "DEFAULT_TIMEOUT_MS", default_value_t = 5_000)]
    default_timeout_ms: u64,

    /// Largest per-attempt deadline a client may request
    #[arg(long, env = "MAX_TIMEOUT_MS", default_value_t = 60_000)]
    max_timeout_ms: u64,

    /// Lifetime of the cached region list
    #[arg(long, env = "REGION_CACHE_TTL_MS", default_value_t = 60_000)]
    region_cache_ttl_ms: u64,

    /// Issue leases; when false requests are validated and answered with 503
    #[arg(long, env = "ISSUANCE_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    issuance_enabled: bool,
}

impl Cli {
    fn into_config(self) -> BrokerConfig {
        let directory = match self.nodes_file {
            Some(path) => DirectorySource::File(path),
            None => DirectorySource::Etcd {
                endpoints: self.etcd_endpoints,
                prefix: self.directory_prefix,
            },
        };

        BrokerConfig {
            bind_addr: self.bind_addr,
            directory,
            node_port: self.node_port,
            node_stale_after: self.node_stale_after_secs.map(Duration::from_secs),
            default_timeout: Duration::from_millis(self.default_timeout_ms),
            max_timeout: Duration::from_millis(self.max_timeout_ms),
            issuance_enabled: self.issuance_enabled,
            region_cache_ttl: Duration::from_millis(self.region_cache_ttl_ms),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    init_tracing(&TracingConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    let result = run(config).await;
    shutdown_tracing();
    result
}

async fn run(config: BrokerConfig) -> anyhow::Result<()> {
    let build = BuildInfo::current();
    info!(
        version = %build.full_version(),
        rustc = build.rustc,
        target = build.target,
        built_at = build.built_at,
        "Starting peerlease server"
    );
    info!(
        bind_addr = %config.bind_addr,
        node_port = config.node_port,
        issuance_enabled = config.issuance_enabled,
        "Configuration loaded"
    );

    let metrics_state = match init_metrics() {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "Failed to initialize metrics, /metrics will be unavailable");
            None
        }
    };

    let client: Arc<dyn NodeClient> = Arc::new(HttpNodeClient::new()?);

    let state = match &config.directory {
        DirectorySource::File(path) => {
            let directory = StaticDirectory::from_file(path)
                .await?
                .with_stale_after(config.node_stale_after);
            info!(path = %path.display(), node_count = directory.node_count(), "Loaded node directory from file");
            AppState::new(&config, Arc::new(directory), client)
        }
        DirectorySource::Etcd { endpoints, prefix } => {
            info!(endpoints = ?endpoints, prefix = %prefix, "Connecting to etcd...");
            let directory = EtcdDirectory::connect(endpoints, prefix, &config).await?;
            info!("Connected to etcd");
            AppState::new(&config, Arc::new(directory), client)
        }
    };
    let state = match metrics_state {
        Some(metrics) => state.with_metrics(metrics),
        None => state,
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
