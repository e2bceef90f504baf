//! The in-memory ledger: an append-only sequence of blocks.

use powchain_core::{Block, Transaction};
use thiserror::Error;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error, PartialEq)]
pub enum BlockchainError {
    #[error("previous_hash {got} does not match chain tip {expected}")]
    StaleTip { expected: String, got: String },

    /// The chain broke one of its own structural invariants. This is a bug,
    /// never a recoverable condition.
    #[error("structural invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, BlockchainError>;

/// The ordered, never-empty sequence of blocks owned by a node.
///
/// Blocks are only ever appended one at a time or swapped out wholesale by
/// [`Blockchain::replace`]; existing blocks are never edited.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    /// Create a chain holding only a fresh genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// Get the current chain length.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the latest block.
    pub fn last_block(&self) -> &Block {
        // `blocks` is non-empty by construction and `replace` refuses empty input.
        &self.blocks[self.blocks.len() - 1]
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Seal a new block on top of the current tip and append it.
    ///
    /// `previous_hash` must be the digest of the current last block. A
    /// mismatch means the tip moved since the caller looked at it.
    pub fn append_block(
        &mut self,
        proof: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
    ) -> Result<&Block> {
        let tip = self.last_block();
        let expected = tip.digest();
        if previous_hash != expected {
            return Err(BlockchainError::StaleTip {
                expected,
                got: previous_hash,
            });
        }

        let block = Block::new(tip.index + 1, proof, previous_hash, transactions);
        self.blocks.push(block);
        Ok(self.last_block())
    }

    /// Swap in a whole new sequence of blocks.
    ///
    /// The caller is expected to have validated `blocks`; only the structural
    /// invariants are re-checked here.
    pub fn replace(&mut self, blocks: Vec<Block>) -> Result<()> {
        Self::check_structure(&blocks)?;
        self.blocks = blocks;
        Ok(())
    }

    /// Verify the chain is non-empty and indexed 1..=N without gaps.
    pub fn check_structure(blocks: &[Block]) -> Result<()> {
        if blocks.is_empty() {
            return Err(BlockchainError::InvariantViolation(
                "chain has no blocks".to_string(),
            ));
        }
        for (position, block) in blocks.iter().enumerate() {
            let expected = position as u64 + 1;
            if block.index != expected {
                return Err(BlockchainError::InvariantViolation(format!(
                    "block at position {expected} has index {}",
                    block.index
                )));
            }
        }
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
