//! Weave bootstrap daemon — entry point.
//!
//! Opens the ledger store, serves inbound bootstrap requests, and (when
//! peers are configured) initiates an outbound session to catch up.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use weave_bootstrap::{
    init_logging, BootstrapConfig, BootstrapInitiator, BootstrapListener, BootstrapMetrics,
    LogFormat,
};
use weave_ledger::Ledger;
use weave_store::LedgerStore;

#[derive(Parser)]
#[command(name = "weave-daemon", about = "Weave ledger bootstrap daemon")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory for ledger storage (overrides the config file).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Port for the bootstrap listener (overrides the config file).
    #[arg(long)]
    listen_port: Option<u16>,

    /// Peer to bootstrap from ("ip:port"); may be given multiple times.
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BootstrapConfig::from_toml_file(&path.display().to_string())
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => BootstrapConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(port) = cli.listen_port {
        config.listen_port = port;
    }
    config.bootstrap_peers.extend(cli.peers);

    let format = match config.log_format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Human,
    };
    init_logging(format, &config.log_level);

    let store = Arc::new(
        LedgerStore::open(&config.data_dir, config.map_size)
            .with_context(|| format!("opening store at {}", config.data_dir.display()))?,
    );
    {
        let txn = store.read_txn()?;
        tracing::info!(
            accounts = store.account_count(&txn)?,
            blocks = store.block_count(&txn)?,
            "ledger store opened"
        );
    }
    let ledger = Arc::new(Ledger::new(Arc::clone(&store)));
    let metrics = Arc::new(BootstrapMetrics::new());

    let listener = BootstrapListener::start(
        config.listen_port,
        Arc::clone(&store),
        Arc::clone(&ledger),
        Arc::clone(&metrics),
    )
    .await?;

    let peers: Vec<SocketAddr> = config
        .bootstrap_peers
        .iter()
        .map(|peer| {
            peer.parse()
                .with_context(|| format!("invalid peer address {peer}"))
        })
        .collect::<anyhow::Result<_>>()?;

    let initiator = BootstrapInitiator::new(
        Arc::clone(&store),
        Arc::clone(&ledger),
        config.clone(),
        Arc::clone(&metrics),
    );
    for peer in peers {
        initiator.add_peer(peer);
        initiator.warmup(peer);
    }

    wait_for_signal().await;
    listener.stop();
    tracing::info!("shut down");
    Ok(())
}

/// Block until SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
