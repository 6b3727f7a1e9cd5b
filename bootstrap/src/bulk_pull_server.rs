//! Streams one account's chain newest-first to a requesting peer.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use weave_ledger::{Block, BlockKind};
use weave_messages::BulkPull;
use weave_store::LedgerStore;
use weave_types::BlockHash;

use crate::{BootstrapError, BootstrapMetrics};

pub struct BulkPullServer<'a> {
    store: &'a Arc<LedgerStore>,
    metrics: &'a BootstrapMetrics,
    request: BulkPull,
}

impl<'a> BulkPullServer<'a> {
    pub fn new(
        store: &'a Arc<LedgerStore>,
        metrics: &'a BootstrapMetrics,
        request: BulkPull,
    ) -> Self {
        Self {
            store,
            metrics,
            request,
        }
    }

    /// Walk from the account's head back toward (but not including) the
    /// requested end hash, sending `tag ‖ payload` for each block. An
    /// unknown account produces an empty stream.
    pub async fn run(&self, stream: &mut TcpStream) -> Result<(), BootstrapError> {
        let mut current = {
            let txn = self.store.read_txn()?;
            match self.store.account_get(&txn, &self.request.account)? {
                Some(info) => info.head,
                None => BlockHash::ZERO,
            }
        };

        while !current.is_zero() && current != self.request.end {
            let record = {
                let txn = self.store.read_txn()?;
                self.store.block_get(&txn, &current)?
            };
            let Some((_account, bytes)) = record else {
                tracing::warn!(hash = %current, "chain walk hit a missing block");
                break;
            };
            // Stored bytes are already tag ‖ payload.
            stream.write_all(&bytes).await?;
            self.metrics.pull_blocks_served.inc();
            current = Block::from_wire(&bytes)?.previous();
        }

        stream.write_all(&[BlockKind::NotABlock.tag()]).await?;
        Ok(())
    }
}
