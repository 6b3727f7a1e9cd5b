//! Client side of the bulk pull phase.
//!
//! For each queued `(account, end)` pair, streams the peer's chain
//! newest-first into the staging area and lets a pull synchronizer apply
//! it to the ledger oldest-first. Flushes happen every `flush_count`
//! blocks so one write transaction never grows unbounded; staged blocks
//! survive an incomplete walk, so later chunks can finish the chain.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use weave_ledger::{Block, BlockKind, Ledger, LedgerError, ProcessResult};
use weave_messages::{BulkPull, MessageHeader, MessageType};
use weave_store::LedgerStore;
use weave_types::{Account, BlockHash};

use crate::synchronizer::{BlockSynchronizer, PullSource, SyncError};
use crate::{BootstrapError, BootstrapMetrics};

pub struct BulkPullClient<'a> {
    store: &'a Arc<LedgerStore>,
    ledger: &'a Arc<Ledger>,
    metrics: &'a BootstrapMetrics,
    flush_count: usize,
}

impl<'a> BulkPullClient<'a> {
    pub fn new(
        store: &'a Arc<LedgerStore>,
        ledger: &'a Arc<Ledger>,
        metrics: &'a BootstrapMetrics,
        flush_count: usize,
    ) -> Self {
        Self {
            store,
            ledger,
            metrics,
            flush_count: flush_count.max(1),
        }
    }

    pub async fn run(
        &self,
        stream: &mut TcpStream,
        pulls: &[(Account, BlockHash)],
    ) -> Result<(), BootstrapError> {
        for (account, end) in pulls {
            self.pull_account(stream, account, end).await?;
        }
        Ok(())
    }

    async fn pull_account(
        &self,
        stream: &mut TcpStream,
        account: &Account,
        end: &BlockHash,
    ) -> Result<(), BootstrapError> {
        let header = MessageHeader::new(MessageType::BulkPull);
        let request = BulkPull {
            account: *account,
            end: *end,
        };
        stream.write_all(&header.to_bytes()).await?;
        stream.write_all(&request.to_bytes()).await?;

        let mut buffered: Vec<Block> = Vec::new();
        let mut first: Option<BlockHash> = None;
        loop {
            let mut tag = [0u8; 1];
            stream.read_exact(&mut tag).await?;
            let Some(kind) = BlockKind::from_tag(tag[0]) else {
                return Err(BootstrapError::Protocol(format!(
                    "unknown block tag {:#04x} in pull stream",
                    tag[0]
                )));
            };
            if kind == BlockKind::NotABlock {
                break;
            }
            let Some(payload_len) = kind.payload_len() else {
                return Err(BootstrapError::Protocol(format!(
                    "unexpected block tag {:#04x} in pull stream",
                    tag[0]
                )));
            };
            let mut payload = vec![0u8; payload_len];
            stream.read_exact(&mut payload).await?;
            let block = Block::deserialize(kind, &payload)?;
            if first.is_none() {
                first = Some(block.hash());
            }
            buffered.push(block);
            self.metrics.blocks_pulled.inc();
            if buffered.len() >= self.flush_count {
                self.flush(&mut buffered, first)?;
            }
        }
        self.flush(&mut buffered, first)?;

        // The account's pull is over: whatever is still staged was either
        // applied or abandoned.
        let mut txn = self.store.write_txn()?;
        self.store.staged_clear(&mut txn)?;
        txn.commit()?;
        tracing::debug!(%account, "bulk pull finished");
        Ok(())
    }

    /// Stage the buffered blocks and walk the chain into the ledger,
    /// rooted at the first block the peer sent (its head).
    fn flush(&self, buffered: &mut Vec<Block>, first: Option<BlockHash>) -> Result<(), BootstrapError> {
        let Some(root) = first else {
            return Ok(());
        };
        let mut txn = self.store.write_txn()?;
        for block in buffered.drain(..) {
            self.store
                .staged_put(&mut txn, &block.hash(), &block.to_wire())?;
        }

        let mut synchronizer = BlockSynchronizer::new(PullSource::new(Arc::clone(self.store)));
        let ledger = self.ledger;
        let outcome = synchronizer.synchronize(&mut txn, root, |txn, block| {
            let result = ledger.process(txn, block).map_err(|e| match e {
                LedgerError::Store(e) => SyncError::Store(e),
                _ => SyncError::Rejected(block.hash()),
            })?;
            match result {
                ProcessResult::Accepted | ProcessResult::Old => Ok(()),
                rejected => {
                    tracing::debug!(hash = %block.hash(), result = ?rejected, "pulled block not accepted");
                    Err(SyncError::Rejected(block.hash()))
                }
            }
        });
        match outcome {
            Ok(()) => {}
            Err(SyncError::MissingDependency(hash)) => {
                // More of the chain may still be in flight; keep the
                // staged blocks and try again on the next flush.
                tracing::debug!(%hash, "pull chain incomplete");
            }
            Err(SyncError::Rejected(hash)) => {
                tracing::debug!(%hash, "pull chain abandoned");
            }
            Err(SyncError::Store(e)) => return Err(e.into()),
        }
        txn.commit()?;
        Ok(())
    }
}
