//! Bootstrap staging areas.
//!
//! `staged_pulls` parks blocks received from a peer until the synchronizer
//! has walked their dependency chain into the ledger; it is scoped to one
//! account's pull and cleared when that pull finishes. `unsynced` records
//! local frontiers believed unknown to the peer, written during the
//! frontier exchange and drained by the bulk push phase.

use serde::{Deserialize, Serialize};

use weave_types::{Account, BlockHash};

use crate::{LedgerStore, ReadTxn, StoreError, WriteTxn};

/// A frontier queued for push: the local head to walk from, and the head
/// the peer advertised for the same account (zero when the peer does not
/// know the account at all).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsyncedInfo {
    pub head: BlockHash,
    pub peer_head: BlockHash,
}

impl LedgerStore {
    // ── Pull staging ────────────────────────────────────────────────────

    pub fn staged_put(
        &self,
        txn: &mut WriteTxn<'_>,
        hash: &BlockHash,
        block_bytes: &[u8],
    ) -> Result<(), StoreError> {
        self.staged_db.put(txn, hash.as_bytes(), block_bytes)?;
        Ok(())
    }

    pub fn staged_get(
        &self,
        txn: &ReadTxn<'_>,
        hash: &BlockHash,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.staged_db.get(txn, hash.as_bytes())?.map(<[u8]>::to_vec))
    }

    pub fn staged_count(&self, txn: &ReadTxn<'_>) -> Result<u64, StoreError> {
        Ok(self.staged_db.len(txn)?)
    }

    pub fn staged_clear(&self, txn: &mut WriteTxn<'_>) -> Result<(), StoreError> {
        self.staged_db.clear(txn)?;
        Ok(())
    }

    // ── Unsynced frontiers ──────────────────────────────────────────────

    pub fn unsynced_put(
        &self,
        txn: &mut WriteTxn<'_>,
        account: &Account,
        info: &UnsyncedInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        self.unsynced_db.put(txn, account.as_bytes(), &bytes)?;
        Ok(())
    }

    /// Every unsynced record in account key order.
    pub fn unsynced_entries(
        &self,
        txn: &ReadTxn<'_>,
    ) -> Result<Vec<(Account, UnsyncedInfo)>, StoreError> {
        let mut entries = Vec::new();
        for entry in self.unsynced_db.iter(txn)? {
            let (key, value) = entry?;
            let account = Account::from_slice(key)
                .ok_or_else(|| StoreError::Serialization("malformed unsynced key".into()))?;
            entries.push((account, bincode::deserialize(value)?));
        }
        Ok(entries)
    }

    pub fn unsynced_clear(&self, txn: &mut WriteTxn<'_>) -> Result<(), StoreError> {
        self.unsynced_db.clear(txn)?;
        Ok(())
    }
}
