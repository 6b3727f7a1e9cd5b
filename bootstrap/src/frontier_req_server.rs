//! Streams `(account, head)` frontier records to a requesting peer.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use weave_messages::{FrontierRecord, FrontierReq};
use weave_store::{LedgerStore, StoreError};
use weave_types::Account;

use crate::{BootstrapError, BootstrapMetrics};

pub struct FrontierReqServer<'a> {
    store: &'a Arc<LedgerStore>,
    metrics: &'a BootstrapMetrics,
    request: FrontierReq,
}

impl<'a> FrontierReqServer<'a> {
    pub fn new(
        store: &'a Arc<LedgerStore>,
        metrics: &'a BootstrapMetrics,
        request: FrontierReq,
    ) -> Self {
        Self {
            store,
            metrics,
            request,
        }
    }

    /// Walk accounts in key order from the requested start, sending one
    /// record per account and awaiting each send before the next read.
    pub async fn run(&self, stream: &mut TcpStream) -> Result<(), BootstrapError> {
        let now = unix_now_secs();
        let mut cursor: Option<Account> = None;
        let mut remaining = self.request.count;
        while remaining > 0 {
            let Some(record) = self.next(&mut cursor, now)? else {
                break;
            };
            stream.write_all(&record.to_bytes()).await?;
            self.metrics.frontiers_sent.inc();
            remaining -= 1;
        }
        stream.write_all(&FrontierRecord::terminator().to_bytes()).await?;
        Ok(())
    }

    /// Next account at or after the cursor that passes the age filter.
    fn next(
        &self,
        cursor: &mut Option<Account>,
        now: u64,
    ) -> Result<Option<FrontierRecord>, StoreError> {
        let txn = self.store.read_txn()?;
        let mut probe = match cursor {
            None => self.store.account_at_or_after(&txn, &self.request.start)?,
            Some(current) => self.store.account_after(&txn, current)?,
        };
        while let Some((account, info)) = probe {
            *cursor = Some(account);
            let age = now.saturating_sub(info.modified);
            if self.request.age == u32::MAX || age <= u64::from(self.request.age) {
                return Ok(Some(FrontierRecord {
                    account,
                    head: info.head,
                }));
            }
            probe = self.store.account_after(&txn, &account)?;
        }
        Ok(None)
    }
}

fn unix_now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
