use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("bad magic: {0:02x}{1:02x}")]
    BadMagic(u8, u8),

    #[error("unknown message type: {0:#04x}")]
    UnknownType(u8),
}
