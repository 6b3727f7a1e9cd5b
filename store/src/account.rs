//! Account table — bincode records keyed by the 32-byte account key.
//!
//! Keys sort by raw bytes, so range queries walk accounts in exactly the
//! order the frontier exchange needs.

use std::ops::Bound;

use serde::{Deserialize, Serialize};

use weave_types::{Account, BlockHash};

use crate::{LedgerStore, ReadTxn, StoreError, WriteTxn};

/// Per-account record in the `accounts` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Hash of the latest block in this account's chain.
    pub head: BlockHash,
    /// Consensus representative.
    pub representative: Account,
    /// Balance after the head block.
    pub balance: u128,
    /// Unix seconds of the last change to this record.
    pub modified: u64,
    /// Number of blocks in this account's chain.
    pub block_count: u64,
}

impl LedgerStore {
    pub fn account_get(
        &self,
        txn: &ReadTxn<'_>,
        account: &Account,
    ) -> Result<Option<AccountInfo>, StoreError> {
        match self.accounts_db.get(txn, account.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn account_put(
        &self,
        txn: &mut WriteTxn<'_>,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        self.accounts_db.put(txn, account.as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn account_exists(&self, txn: &ReadTxn<'_>, account: &Account) -> Result<bool, StoreError> {
        Ok(self.accounts_db.get(txn, account.as_bytes())?.is_some())
    }

    pub fn account_count(&self, txn: &ReadTxn<'_>) -> Result<u64, StoreError> {
        Ok(self.accounts_db.len(txn)?)
    }

    /// First account at or after `start` in key order.
    pub fn account_at_or_after(
        &self,
        txn: &ReadTxn<'_>,
        start: &Account,
    ) -> Result<Option<(Account, AccountInfo)>, StoreError> {
        let key = start.as_bytes().as_slice();
        let bounds = (Bound::Included(key), Bound::<&[u8]>::Unbounded);
        self.account_range_first(txn, &bounds)
    }

    /// First account strictly after `current` in key order.
    pub fn account_after(
        &self,
        txn: &ReadTxn<'_>,
        current: &Account,
    ) -> Result<Option<(Account, AccountInfo)>, StoreError> {
        let key = current.as_bytes().as_slice();
        let bounds = (Bound::Excluded(key), Bound::<&[u8]>::Unbounded);
        self.account_range_first(txn, &bounds)
    }

    fn account_range_first(
        &self,
        txn: &ReadTxn<'_>,
        bounds: &(Bound<&[u8]>, Bound<&[u8]>),
    ) -> Result<Option<(Account, AccountInfo)>, StoreError> {
        let mut iter = self.accounts_db.range(txn, bounds)?;
        match iter.next() {
            Some(entry) => {
                let (key, value) = entry?;
                let account = Account::from_slice(key)
                    .ok_or_else(|| StoreError::Serialization("malformed account key".into()))?;
                Ok(Some((account, bincode::deserialize(value)?)))
            }
            None => Ok(None),
        }
    }

    /// Every `(account, head)` pair in key order.
    pub fn frontiers(&self, txn: &ReadTxn<'_>) -> Result<Vec<(Account, BlockHash)>, StoreError> {
        let mut frontiers = Vec::new();
        for entry in self.accounts_db.iter(txn)? {
            let (key, value) = entry?;
            let account = Account::from_slice(key)
                .ok_or_else(|| StoreError::Serialization("malformed account key".into()))?;
            let info: AccountInfo = bincode::deserialize(value)?;
            frontiers.push((account, info.head));
        }
        Ok(frontiers)
    }
}
