//! Client side of the bulk push phase.
//!
//! Drains the unsynced table: every recorded frontier is walked from the
//! local head back to a block the peer is known to have, and the blocks
//! stream out oldest-first. One `bulk_push` header opens the stream and a
//! single `not_a_block` tag closes it, even when there is nothing to push.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use weave_ledger::BlockKind;
use weave_messages::{MessageHeader, MessageType};
use weave_store::LedgerStore;
use weave_types::BlockHash;

use crate::synchronizer::{BlockSynchronizer, PushSource, SyncError};
use crate::{BootstrapError, BootstrapMetrics};

pub struct BulkPushClient<'a> {
    store: &'a Arc<LedgerStore>,
    metrics: &'a BootstrapMetrics,
}

impl<'a> BulkPushClient<'a> {
    pub fn new(store: &'a Arc<LedgerStore>, metrics: &'a BootstrapMetrics) -> Self {
        Self { store, metrics }
    }

    pub async fn run(&self, stream: &mut TcpStream) -> Result<(), BootstrapError> {
        let (entries, known_to_peer) = {
            let txn = self.store.read_txn()?;
            let entries = self.store.unsynced_entries(&txn)?;
            let known: HashSet<BlockHash> = entries
                .iter()
                .map(|(_, info)| info.peer_head)
                .filter(|head| !head.is_zero())
                .collect();
            (entries, known)
        };

        let header = MessageHeader::new(MessageType::BulkPush);
        stream.write_all(&header.to_bytes()).await?;

        // One synchronizer across all accounts: chains sharing a tail
        // (e.g. through open sources) are pushed at most once.
        let mut synchronizer =
            BlockSynchronizer::new(PushSource::new(Arc::clone(self.store), known_to_peer));
        for (account, info) in entries {
            synchronizer.queue(info.head);
            loop {
                let next = {
                    let txn = self.store.read_txn()?;
                    synchronizer.synchronize_one(&txn)
                };
                match next {
                    Ok(Some(block)) => {
                        stream.write_all(&block.to_wire()).await?;
                        self.metrics.blocks_pushed.inc();
                    }
                    Ok(None) => break,
                    Err(SyncError::Store(e)) => return Err(e.into()),
                    Err(e) => {
                        tracing::warn!(%account, error = %e, "push chain abandoned");
                        synchronizer.reset();
                        break;
                    }
                }
            }
            tracing::debug!(%account, "bulk push finished");
        }

        stream.write_all(&[BlockKind::NotABlock.tag()]).await?;
        stream.flush().await?;

        let mut txn = self.store.write_txn()?;
        self.store.unsynced_clear(&mut txn)?;
        txn.commit()?;
        Ok(())
    }
}
