//! Block application — structural validation against the store.
//!
//! Checks what bootstrap and live ingestion need: the predecessor must
//! exist, the predecessor must be the account's current head (anything else
//! is a fork), a receive's source must exist, and duplicates are reported
//! as old. Signature and proof-of-work validation happen upstream of this
//! subsystem.

use std::sync::Arc;

use weave_store::{AccountInfo, LedgerStore, StoreError, WriteTxn};

use crate::{Block, LedgerError};

/// Outcome of offering one block to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Applied and persisted; the account frontier advanced.
    Accepted,
    /// Already in the ledger.
    Old,
    /// References an unknown previous block.
    GapPrevious,
    /// Open or receive references an unknown source block.
    GapSource,
    /// Previous is not the account head, or the account is already open.
    Fork,
}

pub struct Ledger {
    store: Arc<LedgerStore>,
}

impl Ledger {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Apply one block inside the caller's write transaction.
    pub fn process(
        &self,
        txn: &mut WriteTxn<'_>,
        block: &Block,
    ) -> Result<ProcessResult, LedgerError> {
        let hash = block.hash();
        if self.store.block_exists(txn, &hash)? {
            return Ok(ProcessResult::Old);
        }

        match block {
            Block::Open(open) => {
                if !open.source.is_zero() && !self.store.block_exists(txn, &open.source)? {
                    return Ok(ProcessResult::GapSource);
                }
                if self.store.account_exists(txn, &open.account)? {
                    // A second open competes with the existing chain root.
                    tracing::debug!(hash = %hash, account = %open.account, "open block forks an existing account");
                    return Ok(ProcessResult::Fork);
                }
                self.store
                    .block_put(txn, &hash, &open.account, &block.to_wire())?;
                let info = AccountInfo {
                    head: hash,
                    representative: open.representative,
                    balance: 0,
                    modified: unix_now_secs(),
                    block_count: 1,
                };
                self.store.account_put(txn, &open.account, &info)?;
                Ok(ProcessResult::Accepted)
            }
            _ => {
                let previous = block.previous();
                let Some((account, _)) = self.store.block_get(txn, &previous)? else {
                    return Ok(ProcessResult::GapPrevious);
                };
                let Some(mut info) = self.store.account_get(txn, &account)? else {
                    return Ok(ProcessResult::GapPrevious);
                };
                if info.head != previous {
                    tracing::debug!(hash = %hash, head = %info.head, "previous is not the account head");
                    return Ok(ProcessResult::Fork);
                }
                if let Block::Receive(receive) = block {
                    if !self.store.block_exists(txn, &receive.source)? {
                        return Ok(ProcessResult::GapSource);
                    }
                }
                self.store.block_put(txn, &hash, &account, &block.to_wire())?;
                info.head = hash;
                info.block_count += 1;
                info.modified = unix_now_secs();
                match block {
                    Block::Send(send) => info.balance = send.balance,
                    Block::Change(change) => info.representative = change.representative,
                    _ => {}
                }
                self.store.account_put(txn, &account, &info)?;
                Ok(ProcessResult::Accepted)
            }
        }
    }

    /// Current head of an account's chain, if it is open.
    pub fn head(
        &self,
        txn: &weave_store::ReadTxn<'_>,
        account: &weave_types::Account,
    ) -> Result<Option<weave_types::BlockHash>, StoreError> {
        Ok(self.store.account_get(txn, account)?.map(|info| info.head))
    }
}

fn unix_now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
