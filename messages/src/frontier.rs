//! Frontier request body and frontier stream records.

use weave_types::{Account, BlockHash};

/// Serialized `frontier_req` body length.
pub const FRONTIER_REQ_LEN: usize = 40;

/// Serialized frontier record length.
pub const FRONTIER_RECORD_LEN: usize = 64;

/// `frontier_req` body: scan start, maximum record age, record limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierReq {
    pub start: Account,
    /// Skip accounts last modified more than this many seconds ago;
    /// `u32::MAX` disables the filter.
    pub age: u32,
    /// Stop after this many records; `u32::MAX` means unlimited.
    pub count: u32,
}

impl FrontierReq {
    /// Request every frontier the peer has.
    pub fn all() -> Self {
        Self {
            start: Account::ZERO,
            age: u32::MAX,
            count: u32::MAX,
        }
    }

    pub fn to_bytes(&self) -> [u8; FRONTIER_REQ_LEN] {
        let mut bytes = [0u8; FRONTIER_REQ_LEN];
        bytes[..32].copy_from_slice(self.start.as_bytes());
        bytes[32..36].copy_from_slice(&self.age.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; FRONTIER_REQ_LEN]) -> Self {
        let mut start = [0u8; 32];
        start.copy_from_slice(&bytes[..32]);
        let mut age = [0u8; 4];
        age.copy_from_slice(&bytes[32..36]);
        let mut count = [0u8; 4];
        count.copy_from_slice(&bytes[36..40]);
        Self {
            start: Account::new(start),
            age: u32::from_le_bytes(age),
            count: u32::from_le_bytes(count),
        }
    }
}

/// One `(account, head)` pair in a frontier stream. An all-zero record
/// terminates the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierRecord {
    pub account: Account,
    pub head: BlockHash,
}

impl FrontierRecord {
    pub fn terminator() -> Self {
        Self {
            account: Account::ZERO,
            head: BlockHash::ZERO,
        }
    }

    pub fn is_terminator(&self) -> bool {
        self.account.is_zero() && self.head.is_zero()
    }

    pub fn to_bytes(&self) -> [u8; FRONTIER_RECORD_LEN] {
        let mut bytes = [0u8; FRONTIER_RECORD_LEN];
        bytes[..32].copy_from_slice(self.account.as_bytes());
        bytes[32..].copy_from_slice(self.head.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; FRONTIER_RECORD_LEN]) -> Self {
        let mut account = [0u8; 32];
        account.copy_from_slice(&bytes[..32]);
        let mut head = [0u8; 32];
        head.copy_from_slice(&bytes[32..]);
        Self {
            account: Account::new(account),
            head: BlockHash::new(head),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        let req = FrontierReq {
            start: Account::new([9; 32]),
            age: 3600,
            count: 128,
        };
        assert_eq!(FrontierReq::from_bytes(&req.to_bytes()), req);
    }

    #[test]
    fn request_all_is_unbounded() {
        let req = FrontierReq::all();
        assert!(req.start.is_zero());
        assert_eq!(req.age, u32::MAX);
        assert_eq!(req.count, u32::MAX);
    }

    #[test]
    fn record_roundtrip() {
        let record = FrontierRecord {
            account: Account::new([1; 32]),
            head: BlockHash::new([2; 32]),
        };
        assert_eq!(FrontierRecord::from_bytes(&record.to_bytes()), record);
        assert!(!record.is_terminator());
    }

    #[test]
    fn terminator_is_all_zero() {
        let terminator = FrontierRecord::terminator();
        assert!(terminator.is_terminator());
        assert_eq!(terminator.to_bytes(), [0u8; FRONTIER_RECORD_LEN]);
    }

    #[test]
    fn record_with_zero_head_only_is_not_a_terminator() {
        let record = FrontierRecord {
            account: Account::new([1; 32]),
            head: BlockHash::ZERO,
        };
        assert!(!record.is_terminator());
    }
}
