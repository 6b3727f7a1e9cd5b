//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{ReadTxn, StoreError, WriteTxn};

const MAX_DBS: u32 = 4;

/// The LMDB environment and its database handles.
pub struct LedgerStore {
    env: Env,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    pub(crate) blocks_db: Database<Bytes, Bytes>,
    pub(crate) staged_db: Database<Bytes, Bytes>,
    pub(crate) unsynced_db: Database<Bytes, Bytes>,
}

impl LedgerStore {
    /// Open or create the store at `path` with the given map size.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let accounts_db = env.create_database(&mut wtxn, Some("accounts"))?;
        let blocks_db = env.create_database(&mut wtxn, Some("blocks"))?;
        let staged_db = env.create_database(&mut wtxn, Some("staged_pulls"))?;
        let unsynced_db = env.create_database(&mut wtxn, Some("unsynced"))?;
        wtxn.commit()?;
        Ok(Self {
            env,
            accounts_db,
            blocks_db,
            staged_db,
            unsynced_db,
        })
    }

    pub fn read_txn(&self) -> Result<ReadTxn<'_>, StoreError> {
        Ok(self.env.read_txn()?)
    }

    pub fn write_txn(&self) -> Result<WriteTxn<'_>, StoreError> {
        Ok(self.env.write_txn()?)
    }
}
