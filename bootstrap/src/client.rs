//! Client side of an outbound bootstrap session.
//!
//! One TCP connection carries the whole session: the frontier exchange
//! decides what to pull and what to push, then the bulk pull and bulk push
//! phases run in order on the same socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use weave_ledger::Ledger;
use weave_messages::{
    FrontierRecord, FrontierReq, MessageHeader, MessageType, FRONTIER_RECORD_LEN,
};
use weave_store::{AccountInfo, LedgerStore, StoreError, UnsyncedInfo};
use weave_types::{Account, BlockHash};

use crate::bulk_pull_client::BulkPullClient;
use crate::bulk_push_client::BulkPushClient;
use crate::{BootstrapConfig, BootstrapError, BootstrapMetrics};

pub struct BootstrapClient {
    store: Arc<LedgerStore>,
    ledger: Arc<Ledger>,
    config: BootstrapConfig,
    metrics: Arc<BootstrapMetrics>,
}

impl BootstrapClient {
    pub fn new(
        store: Arc<LedgerStore>,
        ledger: Arc<Ledger>,
        config: BootstrapConfig,
        metrics: Arc<BootstrapMetrics>,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            metrics,
        }
    }

    /// Run one complete session against `endpoint`.
    pub async fn run(&self, endpoint: SocketAddr) -> Result<(), BootstrapError> {
        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let mut stream = tokio::time::timeout(connect_timeout, TcpStream::connect(endpoint))
            .await
            .map_err(|_| BootstrapError::ConnectTimeout { endpoint })??;
        tracing::info!(%endpoint, "bootstrap session started");

        // Leftovers from an aborted session must not leak into this one.
        {
            let mut txn = self.store.write_txn()?;
            self.store.staged_clear(&mut txn)?;
            self.store.unsynced_clear(&mut txn)?;
            txn.commit()?;
        }

        let mut frontier_client = FrontierReqClient::new(&self.store, &self.metrics);
        let pulls = frontier_client.run(&mut stream).await?;
        tracing::debug!(pulls = pulls.len(), "frontier exchange completed");

        BulkPullClient::new(
            &self.store,
            &self.ledger,
            &self.metrics,
            self.config.pull_flush_count,
        )
        .run(&mut stream, &pulls)
        .await?;

        BulkPushClient::new(&self.store, &self.metrics)
            .run(&mut stream)
            .await?;

        tracing::info!(%endpoint, "bootstrap session finished");
        Ok(())
    }
}

/// Runs the frontier exchange: streams the peer's `(account, head)` pairs
/// and merges them against the local account set, in key order.
pub struct FrontierReqClient<'a> {
    store: &'a Arc<LedgerStore>,
    metrics: &'a BootstrapMetrics,
    /// Local iteration cursor: the next local account not yet reconciled.
    current: Option<(Account, AccountInfo)>,
    /// Accounts to pull, with the local head as the stream end bound
    /// (zero when the account is unknown locally).
    pulls: Vec<(Account, BlockHash)>,
    /// Local frontiers the peer lacks, queued for the push phase.
    unsynced: Vec<(Account, UnsyncedInfo)>,
}

impl<'a> FrontierReqClient<'a> {
    pub fn new(store: &'a Arc<LedgerStore>, metrics: &'a BootstrapMetrics) -> Self {
        Self {
            store,
            metrics,
            current: None,
            pulls: Vec::new(),
            unsynced: Vec::new(),
        }
    }

    pub async fn run(
        &mut self,
        stream: &mut TcpStream,
    ) -> Result<Vec<(Account, BlockHash)>, BootstrapError> {
        let header = MessageHeader::new(MessageType::FrontierReq);
        stream.write_all(&header.to_bytes()).await?;
        stream.write_all(&FrontierReq::all().to_bytes()).await?;

        self.current = self.first_local()?;
        let mut previous_remote: Option<Account> = None;
        let mut buffer = [0u8; FRONTIER_RECORD_LEN];
        loop {
            stream.read_exact(&mut buffer).await?;
            let record = FrontierRecord::from_bytes(&buffer);
            if record.is_terminator() {
                break;
            }
            // Each account may appear once, in ascending key order.
            if previous_remote.is_some_and(|previous| record.account <= previous) {
                return Err(BootstrapError::Protocol(format!(
                    "frontier stream out of order at {}",
                    record.account
                )));
            }
            previous_remote = Some(record.account);
            self.metrics.frontiers_received.inc();
            self.reconcile(&record)?;
        }

        // Everything left locally is unknown to the peer.
        while let Some((account, info)) = self.current.take() {
            self.unsynced.push((
                account,
                UnsyncedInfo {
                    head: info.head,
                    peer_head: BlockHash::ZERO,
                },
            ));
            self.current = self.next_local(&account)?;
        }

        self.commit_unsynced()?;
        Ok(std::mem::take(&mut self.pulls))
    }

    /// Merge one remote frontier against the local cursor.
    fn reconcile(&mut self, record: &FrontierRecord) -> Result<(), StoreError> {
        // Local accounts the peer skipped past are unknown to it.
        while let Some((account, info)) = self.current.clone() {
            if account >= record.account {
                break;
            }
            self.unsynced.push((
                account,
                UnsyncedInfo {
                    head: info.head,
                    peer_head: BlockHash::ZERO,
                },
            ));
            self.current = self.next_local(&account)?;
        }

        match self.current.clone() {
            Some((account, info)) if account == record.account => {
                if info.head != record.head {
                    // Diverged: pull their side past our head, and queue
                    // our side for push.
                    self.pulls.push((record.account, info.head));
                    self.unsynced.push((
                        record.account,
                        UnsyncedInfo {
                            head: info.head,
                            peer_head: record.head,
                        },
                    ));
                }
                self.current = self.next_local(&account)?;
            }
            _ => {
                // The peer has an account we do not.
                self.pulls.push((record.account, BlockHash::ZERO));
            }
        }
        Ok(())
    }

    fn first_local(&self) -> Result<Option<(Account, AccountInfo)>, StoreError> {
        let txn = self.store.read_txn()?;
        self.store.account_at_or_after(&txn, &Account::ZERO)
    }

    fn next_local(&self, after: &Account) -> Result<Option<(Account, AccountInfo)>, StoreError> {
        let txn = self.store.read_txn()?;
        self.store.account_after(&txn, after)
    }

    fn commit_unsynced(&mut self) -> Result<(), StoreError> {
        if self.unsynced.is_empty() {
            return Ok(());
        }
        let mut txn = self.store.write_txn()?;
        for (account, info) in self.unsynced.drain(..) {
            self.store.unsynced_put(&mut txn, &account, &info)?;
        }
        txn.commit()?;
        Ok(())
    }
}
