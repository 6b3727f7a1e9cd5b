//! Block table — canonical block bytes keyed by hash.
//!
//! Values are `owning account (32 bytes) ‖ block wire bytes`. The account
//! prefix lets a chain walk resolve which account a non-open block belongs
//! to without re-deriving it.

use weave_types::{Account, BlockHash};

use crate::{LedgerStore, ReadTxn, StoreError, WriteTxn};

impl LedgerStore {
    pub fn block_put(
        &self,
        txn: &mut WriteTxn<'_>,
        hash: &BlockHash,
        account: &Account,
        block_bytes: &[u8],
    ) -> Result<(), StoreError> {
        let mut value = Vec::with_capacity(32 + block_bytes.len());
        value.extend_from_slice(account.as_bytes());
        value.extend_from_slice(block_bytes);
        self.blocks_db.put(txn, hash.as_bytes(), &value)?;
        Ok(())
    }

    /// Fetch a block's owning account and wire bytes.
    pub fn block_get(
        &self,
        txn: &ReadTxn<'_>,
        hash: &BlockHash,
    ) -> Result<Option<(Account, Vec<u8>)>, StoreError> {
        match self.blocks_db.get(txn, hash.as_bytes())? {
            Some(value) if value.len() > 32 => {
                let account = Account::from_slice(&value[..32])
                    .ok_or_else(|| StoreError::Serialization("malformed block record".into()))?;
                Ok(Some((account, value[32..].to_vec())))
            }
            Some(_) => Err(StoreError::Serialization("truncated block record".into())),
            None => Ok(None),
        }
    }

    pub fn block_exists(&self, txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.blocks_db.get(txn, hash.as_bytes())?.is_some())
    }

    pub fn block_count(&self, txn: &ReadTxn<'_>) -> Result<u64, StoreError> {
        Ok(self.blocks_db.len(txn)?)
    }
}
