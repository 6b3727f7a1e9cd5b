use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect to {endpoint} timed out")]
    ConnectTimeout { endpoint: SocketAddr },

    #[error("message error: {0}")]
    Message(#[from] weave_messages::MessageError),

    #[error("ledger error: {0}")]
    Ledger(#[from] weave_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] weave_store::StoreError),

    #[error("lmdb error: {0}")]
    Lmdb(#[from] heed::Error),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("config error: {0}")]
    Config(String),
}
