//! Receives pushed blocks and feeds them to the ledger.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use weave_ledger::{Block, BlockKind, Ledger, ProcessResult};
use weave_store::LedgerStore;

use crate::{BootstrapError, BootstrapMetrics};

pub struct BulkPushServer<'a> {
    store: &'a Arc<LedgerStore>,
    ledger: &'a Arc<Ledger>,
    metrics: &'a BootstrapMetrics,
}

impl<'a> BulkPushServer<'a> {
    pub fn new(
        store: &'a Arc<LedgerStore>,
        ledger: &'a Arc<Ledger>,
        metrics: &'a BootstrapMetrics,
    ) -> Self {
        Self {
            store,
            ledger,
            metrics,
        }
    }

    /// Read `tag ‖ payload` pairs until the `not_a_block` terminator,
    /// applying each block as it arrives. Rejected blocks are dropped;
    /// the stream continues.
    pub async fn run(&self, stream: &mut TcpStream) -> Result<(), BootstrapError> {
        loop {
            let mut tag = [0u8; 1];
            stream.read_exact(&mut tag).await?;
            let Some(kind) = BlockKind::from_tag(tag[0]) else {
                return Err(BootstrapError::Protocol(format!(
                    "unknown block tag {:#04x} in push stream",
                    tag[0]
                )));
            };
            if kind == BlockKind::NotABlock {
                return Ok(());
            }
            let Some(payload_len) = kind.payload_len() else {
                return Err(BootstrapError::Protocol(format!(
                    "unexpected block tag {:#04x} in push stream",
                    tag[0]
                )));
            };
            let mut payload = vec![0u8; payload_len];
            stream.read_exact(&mut payload).await?;
            let block = Block::deserialize(kind, &payload)?;
            self.metrics.push_blocks_received.inc();

            let mut txn = self.store.write_txn()?;
            let result = self.ledger.process(&mut txn, &block)?;
            txn.commit()?;
            match result {
                ProcessResult::Accepted | ProcessResult::Old => {}
                other => {
                    tracing::debug!(hash = %block.hash(), result = ?other, "pushed block not accepted");
                }
            }
        }
    }
}
