//! Bootstrap subsystem — reconciles the local ledger with a remote peer.
//!
//! A session runs three phases on one TCP connection:
//!
//! 1. **Frontier exchange** — the client asks for every `(account, head)`
//!    pair the peer has and compares the stream against its own accounts in
//!    key order, producing a pull list (peer is ahead or has accounts we
//!    lack) and an unsynced list (we are ahead or have accounts the peer
//!    lacks).
//! 2. **Bulk pull** — missing chains stream in newest-first, are staged,
//!    and a dependency walk applies them to the ledger oldest-first.
//! 3. **Bulk push** — chains the peer lacks stream out oldest-first.
//!
//! [`BootstrapInitiator`] owns outbound sessions (one at a time);
//! [`BootstrapListener`] accepts inbound ones and serves the matching
//! request types.

pub mod bulk_pull_client;
pub mod bulk_pull_server;
pub mod bulk_push_client;
pub mod bulk_push_server;
pub mod client;
pub mod config;
pub mod error;
pub mod frontier_req_server;
pub mod initiator;
pub mod listener;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod synchronizer;

pub use bulk_pull_client::BulkPullClient;
pub use bulk_pull_server::BulkPullServer;
pub use bulk_push_client::BulkPushClient;
pub use bulk_push_server::BulkPushServer;
pub use client::{BootstrapClient, FrontierReqClient};
pub use config::BootstrapConfig;
pub use error::BootstrapError;
pub use frontier_req_server::FrontierReqServer;
pub use initiator::BootstrapInitiator;
pub use listener::BootstrapListener;
pub use logging::{init_logging, LogFormat};
pub use metrics::BootstrapMetrics;
pub use server::BootstrapServer;
pub use synchronizer::{
    BlockSynchronizer, PullSource, PullSynchronizer, PushSource, PushSynchronizer, SyncError,
    SyncSource,
};
