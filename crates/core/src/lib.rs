//! Core ledger primitives for powchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Blake3 hashing and hex digests
//! - Transactions
//! - Blocks and their canonical digest

pub mod block;
pub mod hash;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
pub use hash::{hash, Hash};
pub use transaction::{Transaction, TransactionError};
