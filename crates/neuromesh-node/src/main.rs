//! # Neuromesh Node
//!
//! The main entry point for running a neuromesh node.

use anyhow::{Context, Result};
use clap::Parser;
use neuromesh_coordinator::Coordinator;
use neuromesh_identity::Keypair;
use neuromesh_node::config::NodeConfig;
use neuromesh_node::error::{NodeError, Result as NodeResult};
use neuromesh_node::{health, mesh, observability};
use neuromesh_p2p::InProcessNetwork;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Loads, overrides, and validates configuration. Kept distinct from
/// `main` so it returns the library-crate `NodeError` this binary
/// otherwise only wraps, not `anyhow`.
fn load_config(args: &Args) -> NodeResult<NodeConfig> {
    let mut config = if args.config.exists() {
        NodeConfig::from_file(&args.config)?
    } else {
        NodeConfig::default()
    };
    config.merge_env()?;
    if let Some(addr) = args.health_addr {
        config.health.addr = addr;
    }
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }
    config.validate_config()?;
    Ok(config)
}

/// Derives this node's identity and constructs its `Coordinator`.
fn assemble(config: &NodeConfig, network: InProcessNetwork) -> NodeResult<Arc<Coordinator>> {
    let keypair = match &config.private_key_seed {
        Some(seed_hex) => {
            let bytes = hex::decode(seed_hex)
                .map_err(|e| NodeError::Config(neuromesh_node::config::ConfigError::Invalid(format!(
                    "private_key_seed is not valid hex: {e}"
                ))))?;
            if bytes.len() != 8 {
                return Err(NodeError::Config(neuromesh_node::config::ConfigError::Invalid(format!(
                    "private_key_seed must decode to 8 bytes, got {}",
                    bytes.len()
                ))));
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes);
            Keypair::from_seed(u64::from_be_bytes(raw))
        }
        None => Keypair::generate(),
    };

    Ok(Coordinator::new(config.coordinator_config(), keypair, network)?)
}

/// Runs a single neuromesh node: Agent Manager, Transport, Topology, and
/// Consensus Engine behind one process.
#[derive(Parser, Debug)]
#[command(name = "neuromesh-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Missing file falls back to defaults.
    #[arg(short, long, default_value = "node.toml")]
    config: PathBuf,

    /// Health/readiness/status HTTP listen address.
    #[arg(long)]
    health_addr: Option<SocketAddr>,

    /// Data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, pretty).
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args).context("loading node configuration")?;

    observability::init_logging(
        &config.logging.level,
        config.logging.format.eq_ignore_ascii_case("json"),
    );

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting neuromesh node");

    std::fs::create_dir_all(&config.storage.data_dir)
        .with_context(|| format!("creating data directory {}", config.storage.data_dir.display()))?;

    let network = InProcessNetwork::new();
    let coordinator = assemble(&config, network).context("assembling coordinator")?;
    tracing::info!(node_id = %coordinator.node_id(), "node identity initialized");

    let runtime = mesh::MeshRuntime::new(Arc::clone(&coordinator), config.topology_config());
    let monitoring_interval = Duration::from_millis(config.mesh.monitoring_interval_ms);
    let mut tasks = runtime.spawn(monitoring_interval);

    let health_state = health::HealthState::new(Arc::clone(&coordinator), runtime.topology());
    let health_router = health::health_routes(health_state.clone());
    let listener = tokio::net::TcpListener::bind(config.health.addr)
        .await
        .with_context(|| format!("binding health listener on {}", config.health.addr))?;
    tracing::info!(addr = %config.health.addr, "health server listening");
    let health_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, health_router).await {
            tracing::error!(%err, "health server exited with an error");
        }
    });
    tasks.push(health_handle);

    health_state.set_ready(true);
    tracing::info!("neuromesh node running, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    tracing::info!("shutdown signal received, stopping");

    health_state.set_ready(false);
    coordinator.shutdown();
    for task in tasks {
        task.abort();
    }

    Ok(())
}
