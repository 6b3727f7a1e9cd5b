//! LMDB storage for the Weave ledger.
//!
//! One [`LedgerStore`] wraps a single LMDB environment holding four
//! databases:
//!
//! - `accounts` — account key → [`AccountInfo`] (bincode), iterated in key
//!   order by the frontier exchange,
//! - `blocks` — block hash → owning account + canonical block bytes,
//! - `staged_pulls` — blocks received over the wire, parked until the
//!   synchronizer walks them into the ledger,
//! - `unsynced` — frontiers queued for push to a peer.
//!
//! Every operation takes an explicit transaction handle. A write
//! transaction commits explicitly; dropping it without committing aborts
//! every operation made through it.

pub mod account;
pub mod block;
pub mod environment;
pub mod error;
pub mod staging;

pub use account::AccountInfo;
pub use environment::LedgerStore;
pub use error::StoreError;
pub use staging::UnsyncedInfo;

/// Read transaction handle — shared snapshot access.
pub type ReadTxn<'a> = heed::RoTxn<'a>;
/// Write transaction handle — exclusive; aborts on drop, commits explicitly.
pub type WriteTxn<'a> = heed::RwTxn<'a>;
