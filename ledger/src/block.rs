//! Block variants and their canonical serialization.
//!
//! Wire and storage use the same layout: a one-byte type tag followed by a
//! fixed-size payload. Balances are big-endian, the work nonce is
//! little-endian. The block hash covers every field except the signature
//! and work, so neither can change a block's identity.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use weave_types::{Account, BlockHash, Signature};

use crate::LedgerError;

type Blake2b256 = Blake2b<U32>;

const SEND_PAYLOAD_LEN: usize = 152;
const RECEIVE_PAYLOAD_LEN: usize = 136;
const OPEN_PAYLOAD_LEN: usize = 168;
const CHANGE_PAYLOAD_LEN: usize = 136;

/// One-byte block type tag used on the wire and in storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockKind {
    Invalid = 0,
    /// Stream terminator — not a real block.
    NotABlock = 1,
    Send = 2,
    Receive = 3,
    Open = 4,
    Change = 5,
}

impl BlockKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(BlockKind::Invalid),
            1 => Some(BlockKind::NotABlock),
            2 => Some(BlockKind::Send),
            3 => Some(BlockKind::Receive),
            4 => Some(BlockKind::Open),
            5 => Some(BlockKind::Change),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Fixed payload size following the tag, for kinds that carry one.
    pub fn payload_len(self) -> Option<usize> {
        match self {
            BlockKind::Send => Some(SEND_PAYLOAD_LEN),
            BlockKind::Receive => Some(RECEIVE_PAYLOAD_LEN),
            BlockKind::Open => Some(OPEN_PAYLOAD_LEN),
            BlockKind::Change => Some(CHANGE_PAYLOAD_LEN),
            BlockKind::Invalid | BlockKind::NotABlock => None,
        }
    }
}

/// Transfers funds toward `destination` and states the remaining balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub previous: BlockHash,
    pub destination: Account,
    /// Account balance after this send.
    pub balance: u128,
    pub signature: Signature,
    pub work: u64,
}

/// Claims the funds of a send block on another chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub previous: BlockHash,
    /// Hash of the send block being received.
    pub source: BlockHash,
    pub signature: Signature,
    pub work: u64,
}

/// First block of an account chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    /// Hash of the send block that funded this account; zero for genesis.
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
    pub signature: Signature,
    pub work: u64,
}

/// Rotates the account's consensus representative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeBlock {
    pub previous: BlockHash,
    pub representative: Account,
    pub signature: Signature,
    pub work: u64,
}

/// A block in the lattice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Send(_) => BlockKind::Send,
            Block::Receive(_) => BlockKind::Receive,
            Block::Open(_) => BlockKind::Open,
            Block::Change(_) => BlockKind::Change,
        }
    }

    /// Blake2b-256 over the hashable fields, in serialization order.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Blake2b256::new();
        match self {
            Block::Send(b) => {
                hasher.update(b.previous.as_bytes());
                hasher.update(b.destination.as_bytes());
                hasher.update(b.balance.to_be_bytes());
            }
            Block::Receive(b) => {
                hasher.update(b.previous.as_bytes());
                hasher.update(b.source.as_bytes());
            }
            Block::Open(b) => {
                hasher.update(b.source.as_bytes());
                hasher.update(b.representative.as_bytes());
                hasher.update(b.account.as_bytes());
            }
            Block::Change(b) => {
                hasher.update(b.previous.as_bytes());
                hasher.update(b.representative.as_bytes());
            }
        }
        let result = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        BlockHash::new(bytes)
    }

    /// Chain predecessor — zero for an open block. Walks one account's
    /// chain from the head toward its open.
    pub fn previous(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.previous,
            Block::Receive(b) => b.previous,
            Block::Open(_) => BlockHash::ZERO,
            Block::Change(b) => b.previous,
        }
    }

    /// Causal predecessor — the block that must exist before this one can
    /// be applied: `previous`, or the funding source for an open block.
    pub fn dependency(&self) -> BlockHash {
        match self {
            Block::Open(b) => b.source,
            other => other.previous(),
        }
    }

    /// Serialize the payload (without the leading tag byte).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(OPEN_PAYLOAD_LEN);
        match self {
            Block::Send(b) => {
                buffer.extend_from_slice(b.previous.as_bytes());
                buffer.extend_from_slice(b.destination.as_bytes());
                buffer.extend_from_slice(&b.balance.to_be_bytes());
                buffer.extend_from_slice(b.signature.as_bytes());
                buffer.extend_from_slice(&b.work.to_le_bytes());
            }
            Block::Receive(b) => {
                buffer.extend_from_slice(b.previous.as_bytes());
                buffer.extend_from_slice(b.source.as_bytes());
                buffer.extend_from_slice(b.signature.as_bytes());
                buffer.extend_from_slice(&b.work.to_le_bytes());
            }
            Block::Open(b) => {
                buffer.extend_from_slice(b.source.as_bytes());
                buffer.extend_from_slice(b.representative.as_bytes());
                buffer.extend_from_slice(b.account.as_bytes());
                buffer.extend_from_slice(b.signature.as_bytes());
                buffer.extend_from_slice(&b.work.to_le_bytes());
            }
            Block::Change(b) => {
                buffer.extend_from_slice(b.previous.as_bytes());
                buffer.extend_from_slice(b.representative.as_bytes());
                buffer.extend_from_slice(b.signature.as_bytes());
                buffer.extend_from_slice(&b.work.to_le_bytes());
            }
        }
        buffer
    }

    /// Serialize as `tag ‖ payload` — the form used on the wire and in the
    /// block table.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(1 + OPEN_PAYLOAD_LEN);
        buffer.push(self.kind().tag());
        buffer.extend_from_slice(&self.serialize());
        buffer
    }

    /// Deserialize a payload of the given kind. The payload length must
    /// match the kind's fixed size exactly.
    pub fn deserialize(kind: BlockKind, payload: &[u8]) -> Result<Block, LedgerError> {
        let expected = kind
            .payload_len()
            .ok_or(LedgerError::InvalidKind(kind.tag()))?;
        if payload.len() != expected {
            return Err(LedgerError::PayloadLength {
                expected,
                got: payload.len(),
            });
        }
        let mut reader = Reader { payload, offset: 0 };
        let block = match kind {
            BlockKind::Send => Block::Send(SendBlock {
                previous: reader.hash(),
                destination: reader.account(),
                balance: reader.u128_be(),
                signature: reader.signature(),
                work: reader.u64_le(),
            }),
            BlockKind::Receive => Block::Receive(ReceiveBlock {
                previous: reader.hash(),
                source: reader.hash(),
                signature: reader.signature(),
                work: reader.u64_le(),
            }),
            BlockKind::Open => Block::Open(OpenBlock {
                source: reader.hash(),
                representative: reader.account(),
                account: reader.account(),
                signature: reader.signature(),
                work: reader.u64_le(),
            }),
            BlockKind::Change => Block::Change(ChangeBlock {
                previous: reader.hash(),
                representative: reader.account(),
                signature: reader.signature(),
                work: reader.u64_le(),
            }),
            BlockKind::Invalid | BlockKind::NotABlock => {
                return Err(LedgerError::InvalidKind(kind.tag()))
            }
        };
        Ok(block)
    }

    /// Deserialize a `tag ‖ payload` record (block table values).
    pub fn from_wire(bytes: &[u8]) -> Result<Block, LedgerError> {
        let (&tag, payload) = bytes
            .split_first()
            .ok_or(LedgerError::PayloadLength { expected: 1, got: 0 })?;
        let kind = BlockKind::from_tag(tag).ok_or(LedgerError::InvalidKind(tag))?;
        Block::deserialize(kind, payload)
    }
}

/// Cursor over a payload whose length was checked up front.
struct Reader<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn take(&mut self, len: usize) -> &[u8] {
        let slice = &self.payload[self.offset..self.offset + len];
        self.offset += len;
        slice
    }

    fn hash(&mut self) -> BlockHash {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(self.take(32));
        BlockHash::new(bytes)
    }

    fn account(&mut self) -> Account {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(self.take(32));
        Account::new(bytes)
    }

    fn signature(&mut self) -> Signature {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(self.take(64));
        Signature(bytes)
    }

    fn u128_be(&mut self) -> u128 {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(self.take(16));
        u128::from_be_bytes(bytes)
    }

    fn u64_le(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8));
        u64::from_le_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_send() -> Block {
        Block::Send(SendBlock {
            previous: BlockHash::new([1; 32]),
            destination: Account::new([2; 32]),
            balance: 1_000_000,
            signature: Signature([3; 64]),
            work: 0xDEADBEEF,
        })
    }

    fn sample_open() -> Block {
        Block::Open(OpenBlock {
            source: BlockHash::new([4; 32]),
            representative: Account::new([5; 32]),
            account: Account::new([6; 32]),
            signature: Signature([7; 64]),
            work: 42,
        })
    }

    #[test]
    fn payload_sizes_are_fixed() {
        assert_eq!(sample_send().serialize().len(), 152);
        assert_eq!(sample_open().serialize().len(), 168);
        let receive = Block::Receive(ReceiveBlock {
            previous: BlockHash::new([1; 32]),
            source: BlockHash::new([2; 32]),
            signature: Signature([0; 64]),
            work: 0,
        });
        assert_eq!(receive.serialize().len(), 136);
        let change = Block::Change(ChangeBlock {
            previous: BlockHash::new([1; 32]),
            representative: Account::new([2; 32]),
            signature: Signature([0; 64]),
            work: 0,
        });
        assert_eq!(change.serialize().len(), 136);
    }

    #[test]
    fn wire_roundtrip_preserves_every_field() {
        for block in [sample_send(), sample_open()] {
            let decoded = Block::from_wire(&block.to_wire()).unwrap();
            assert_eq!(decoded, block);
        }
    }

    #[test]
    fn hash_excludes_signature_and_work() {
        let a = sample_send();
        let mut b = sample_send();
        if let Block::Send(send) = &mut b {
            send.signature = Signature([0xFF; 64]);
            send.work = 999_999;
        }
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_covers_the_payload_fields() {
        let a = sample_send();
        let mut b = sample_send();
        if let Block::Send(send) = &mut b {
            send.balance += 1;
        }
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn dependency_is_source_for_open_and_previous_otherwise() {
        assert_eq!(sample_send().dependency(), BlockHash::new([1; 32]));
        assert_eq!(sample_open().dependency(), BlockHash::new([4; 32]));
        // previous() walks the chain, so an open terminates it.
        assert_eq!(sample_open().previous(), BlockHash::ZERO);
    }

    #[test]
    fn wrong_payload_length_is_rejected() {
        let mut bytes = sample_send().serialize();
        bytes.pop();
        let err = Block::deserialize(BlockKind::Send, &bytes).unwrap_err();
        assert!(matches!(err, LedgerError::PayloadLength { .. }));
    }

    #[test]
    fn terminator_tags_never_deserialize() {
        assert!(Block::deserialize(BlockKind::NotABlock, &[]).is_err());
        assert!(Block::from_wire(&[0x01]).is_err());
        assert!(Block::from_wire(&[]).is_err());
        assert!(Block::from_wire(&[0xFE, 1, 2, 3]).is_err());
    }
}
