//! Wire framing for node-to-node bootstrap traffic.
//!
//! Every message starts with a fixed 8-byte header; the bodies that follow
//! are fixed-size per message type. `bulk_push` carries no body of its own
//! — it is followed directly by a block stream terminated by the
//! `not_a_block` tag.

pub mod bulk;
pub mod error;
pub mod frontier;
pub mod header;

pub use bulk::{BulkPull, BULK_PULL_LEN};
pub use error::MessageError;
pub use frontier::{FrontierRecord, FrontierReq, FRONTIER_RECORD_LEN, FRONTIER_REQ_LEN};
pub use header::{MessageHeader, MessageType, HEADER_LEN, MAGIC, PROTOCOL_VERSION};
