//! `bulk_pull` request body.
//!
//! `bulk_push` has no body: its header is followed directly by a stream of
//! `tag ‖ payload` blocks ending with the `not_a_block` tag.

use weave_types::{Account, BlockHash};

/// Serialized `bulk_pull` body length.
pub const BULK_PULL_LEN: usize = 64;

/// Ask a peer to stream one account's chain from its head back toward
/// (but not including) `end`. A zero `end` pulls the whole chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulkPull {
    pub account: Account,
    pub end: BlockHash,
}

impl BulkPull {
    pub fn to_bytes(&self) -> [u8; BULK_PULL_LEN] {
        let mut bytes = [0u8; BULK_PULL_LEN];
        bytes[..32].copy_from_slice(self.account.as_bytes());
        bytes[32..].copy_from_slice(self.end.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; BULK_PULL_LEN]) -> Self {
        let mut account = [0u8; 32];
        account.copy_from_slice(&bytes[..32]);
        let mut end = [0u8; 32];
        end.copy_from_slice(&bytes[32..]);
        Self {
            account: Account::new(account),
            end: BlockHash::new(end),
        }
    }
}
