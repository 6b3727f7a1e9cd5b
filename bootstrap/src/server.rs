//! Per-connection inbound session.
//!
//! Reads message headers and serves requests strictly one at a time, in
//! arrival order. Unknown or malformed headers terminate the connection;
//! a clean EOF between requests ends it quietly.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use weave_ledger::Ledger;
use weave_messages::{
    BulkPull, FrontierReq, MessageHeader, MessageType, BULK_PULL_LEN, FRONTIER_REQ_LEN, HEADER_LEN,
};
use weave_store::LedgerStore;

use crate::bulk_pull_server::BulkPullServer;
use crate::bulk_push_server::BulkPushServer;
use crate::frontier_req_server::FrontierReqServer;
use crate::{BootstrapError, BootstrapMetrics};

pub struct BootstrapServer {
    store: Arc<LedgerStore>,
    ledger: Arc<Ledger>,
    metrics: Arc<BootstrapMetrics>,
}

impl BootstrapServer {
    pub fn new(store: Arc<LedgerStore>, ledger: Arc<Ledger>, metrics: Arc<BootstrapMetrics>) -> Self {
        Self {
            store,
            ledger,
            metrics,
        }
    }

    /// Serve requests on one connection until EOF or error.
    pub async fn run(&self, mut stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = self.serve(&mut stream, peer).await {
            tracing::debug!(%peer, error = %e, "bootstrap connection terminated");
        }
    }

    async fn serve(&self, stream: &mut TcpStream, peer: SocketAddr) -> Result<(), BootstrapError> {
        let mut header_buf = [0u8; HEADER_LEN];
        loop {
            match stream.read_exact(&mut header_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::debug!(%peer, "bootstrap connection closed");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
            let header = MessageHeader::from_bytes(&header_buf)?;
            tracing::trace!(%peer, message_type = ?header.message_type, "bootstrap request");
            match header.message_type {
                MessageType::FrontierReq => {
                    let mut body = [0u8; FRONTIER_REQ_LEN];
                    stream.read_exact(&mut body).await?;
                    let request = FrontierReq::from_bytes(&body);
                    FrontierReqServer::new(&self.store, &self.metrics, request)
                        .run(stream)
                        .await?;
                }
                MessageType::BulkPull => {
                    let mut body = [0u8; BULK_PULL_LEN];
                    stream.read_exact(&mut body).await?;
                    let request = BulkPull::from_bytes(&body);
                    BulkPullServer::new(&self.store, &self.metrics, request)
                        .run(stream)
                        .await?;
                }
                MessageType::BulkPush => {
                    BulkPushServer::new(&self.store, &self.ledger, &self.metrics)
                        .run(stream)
                        .await?;
                }
            }
        }
    }
}
