use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("store error: {0}")]
    Store(#[from] weave_store::StoreError),

    #[error("invalid block type tag: {0:#04x}")]
    InvalidKind(u8),

    #[error("block payload length mismatch: expected {expected}, got {got}")]
    PayloadLength { expected: usize, got: usize },
}
