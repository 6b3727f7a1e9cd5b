//! Block model and block application for the Weave block-lattice.
//!
//! Every account owns a chain of blocks; chains reference each other
//! through send/receive pairs. Blocks serialize to a fixed size per type
//! behind a one-byte tag, and hash with Blake2b-256 over everything except
//! the signature and work nonce.

pub mod block;
pub mod error;
pub mod processor;

pub use block::{Block, BlockKind, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};
pub use error::LedgerError;
pub use processor::{Ledger, ProcessResult};
