//! Block structure and its canonical digest.

use crate::hash::{hash, Hash};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// `previous_hash` carried by the genesis block, which has no predecessor.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// A sealed block of the ledger.
///
/// The declaration order of the fields is the canonical serialization order
/// used by [`Block::hash`]. Every node must agree on it, so it must not be
/// reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Unix timestamp in (fractional) seconds.
    pub timestamp: f64,
    /// Transactions recorded by this block, in submission order.
    pub transactions: Vec<Transaction>,
    /// Proof-of-work solution relative to the previous block's proof.
    pub proof: u64,
    /// Hex digest of the previous block, or [`GENESIS_PREVIOUS_HASH`].
    pub previous_hash: String,
}

impl Block {
    /// Create a new block stamped with the current time.
    pub fn new(
        index: u64,
        proof: u64,
        previous_hash: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            timestamp: Self::current_timestamp(),
            transactions,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    /// Create the genesis block.
    pub fn genesis() -> Self {
        Self::new(1, GENESIS_PROOF, GENESIS_PREVIOUS_HASH, Vec::new())
    }

    /// Get the current Unix timestamp in seconds.
    pub fn current_timestamp() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }

    /// Hash of the canonical (bincode) serialization of the block.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Hex digest of the block, the value successors store as `previous_hash`.
    pub fn digest(&self) -> String {
        self.hash().to_hex()
    }

    /// Check if this block is shaped like a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 1 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}
