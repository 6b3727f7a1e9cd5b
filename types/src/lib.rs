//! Fundamental types for the Weave block-lattice.

pub mod account;
pub mod hash;
pub mod keys;

pub use account::Account;
pub use hash::BlockHash;
pub use keys::Signature;
