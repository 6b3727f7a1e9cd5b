//! Inbound bootstrap connection acceptor.

use std::net::{Ipv6Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use weave_ledger::Ledger;
use weave_store::LedgerStore;

use crate::{BootstrapError, BootstrapMetrics, BootstrapServer};

pub struct BootstrapListener {
    local_addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
}

impl BootstrapListener {
    /// Bind `[::]:port` and start accepting. Port 0 picks an ephemeral
    /// port; [`BootstrapListener::local_addr`] reports the bound one.
    pub async fn start(
        port: u16,
        store: Arc<LedgerStore>,
        ledger: Arc<Ledger>,
        metrics: Arc<BootstrapMetrics>,
    ) -> Result<Self, BootstrapError> {
        let listener = TcpListener::bind((Ipv6Addr::UNSPECIFIED, port)).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, mut shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("bootstrap listener stopping");
                        break;
                    }
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            let server = BootstrapServer::new(
                                Arc::clone(&store),
                                Arc::clone(&ledger),
                                Arc::clone(&metrics),
                            );
                            tokio::spawn(async move { server.run(stream, peer).await });
                        }
                        Err(e) => tracing::warn!(error = %e, "accept failed"),
                    },
                }
            }
        });

        tracing::info!(%local_addr, "bootstrap listener started");
        Ok(Self {
            local_addr,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections; in-flight sessions run out.
    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }
}
