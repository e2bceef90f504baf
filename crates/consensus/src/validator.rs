//! Chain validation rules.
//!
//! This module checks that an arbitrary sequence of blocks, typically one
//! fetched from a peer, forms a well-linked chain of valid proofs.

use crate::pow::ProofOfWork;
use powchain_core::{Block, TransactionError, GENESIS_PREVIOUS_HASH};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("genesis block is malformed (index {index}, previous_hash {previous_hash:?})")]
    InvalidGenesis { index: u64, previous_hash: String },

    #[error("genesis block carries {count} transactions")]
    GenesisHasTransactions { count: usize },

    #[error("block index mismatch (expected {expected}, got {got})")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("block {index} previous_hash does not match its predecessor")]
    InvalidPrevHash { index: u64 },

    #[error("block {index} proof {proof} does not satisfy proof of work")]
    InvalidProof { index: u64, proof: u64 },

    #[error("block {index} contains an invalid transaction: {source}")]
    InvalidTransaction {
        index: u64,
        #[source]
        source: TransactionError,
    },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validates candidate chains against the proof-of-work rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainValidator {
    pow: ProofOfWork,
}

impl ChainValidator {
    pub fn new(pow: ProofOfWork) -> Self {
        Self { pow }
    }

    /// Check that the first block is a well-formed genesis block.
    pub fn validate_genesis(block: &Block) -> Result<()> {
        if block.index != 1 || block.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(ValidationError::InvalidGenesis {
                index: block.index,
                previous_hash: block.previous_hash.clone(),
            });
        }
        if !block.transactions.is_empty() {
            return Err(ValidationError::GenesisHasTransactions {
                count: block.tx_count(),
            });
        }
        Ok(())
    }

    /// Check that every transaction of the block has usable fields.
    pub fn validate_transactions(block: &Block) -> Result<()> {
        for tx in &block.transactions {
            tx.validate()
                .map_err(|source| ValidationError::InvalidTransaction {
                    index: block.index,
                    source,
                })?;
        }
        Ok(())
    }

    /// Validate that `block` correctly extends `parent`.
    pub fn validate_block_extends_parent(&self, block: &Block, parent: &Block) -> Result<()> {
        let expected = parent.index + 1;
        if block.index != expected {
            return Err(ValidationError::InvalidIndex {
                expected,
                got: block.index,
            });
        }

        if block.previous_hash != parent.digest() {
            return Err(ValidationError::InvalidPrevHash { index: block.index });
        }

        if !self.pow.is_valid(parent.proof, block.proof) {
            return Err(ValidationError::InvalidProof {
                index: block.index,
                proof: block.proof,
            });
        }

        Self::validate_transactions(block)
    }

    /// Validate a whole chain, stopping at the first violation.
    pub fn validate_chain(&self, chain: &[Block]) -> Result<()> {
        let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
        Self::validate_genesis(genesis)?;

        for pair in chain.windows(2) {
            self.validate_block_extends_parent(&pair[1], &pair[0])?;
        }
        Ok(())
    }

    /// Boolean form of [`ChainValidator::validate_chain`].
    pub fn is_valid_chain(&self, chain: &[Block]) -> bool {
        self.validate_chain(chain).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::PowConfig;
    use powchain_core::Transaction;

    fn validator() -> ChainValidator {
        ChainValidator::new(ProofOfWork::new(PowConfig::new(2).unwrap()))
    }

    fn build_chain(len: usize) -> Vec<Block> {
        let pow = ProofOfWork::new(PowConfig::new(2).unwrap());
        let mut chain = vec![Block::genesis()];
        while chain.len() < len {
            let last = chain.last().unwrap();
            let tx = Transaction::new("A", "B", chain.len() as f64).unwrap();
            let block = Block::new(
                last.index + 1,
                pow.mine(last.proof),
                last.digest(),
                vec![tx],
            );
            chain.push(block);
        }
        chain
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_eq!(validator().validate_chain(&[]), Err(ValidationError::EmptyChain));
    }

    #[test]
    fn test_genesis_only_chain_valid() {
        assert!(validator().is_valid_chain(&[Block::genesis()]));
    }

    #[test]
    fn test_malformed_genesis_rejected() {
        let mut genesis = Block::genesis();
        genesis.previous_hash = "0".repeat(64);
        assert!(matches!(
            validator().validate_chain(&[genesis]),
            Err(ValidationError::InvalidGenesis { .. })
        ));
    }

    #[test]
    fn test_genesis_with_transactions_rejected() {
        let mut genesis = Block::genesis();
        genesis
            .transactions
            .push(Transaction::new("A", "B", 1.0).unwrap());
        assert_eq!(
            validator().validate_chain(&[genesis]),
            Err(ValidationError::GenesisHasTransactions { count: 1 })
        );
    }

    #[test]
    fn test_mined_chain_valid() {
        let chain = build_chain(5);
        assert!(validator().is_valid_chain(&chain));
    }

    #[test]
    fn test_broken_link_rejected() {
        let mut chain = build_chain(4);
        chain[2].previous_hash = "ab".repeat(32);
        assert_eq!(
            validator().validate_chain(&chain),
            Err(ValidationError::InvalidPrevHash { index: 3 })
        );
    }

    #[test]
    fn test_tampered_predecessor_breaks_link() {
        let mut chain = build_chain(3);
        chain[1].transactions[0].amount = 1_000.0;
        assert_eq!(
            validator().validate_chain(&chain),
            Err(ValidationError::InvalidPrevHash { index: 3 })
        );
    }

    #[test]
    fn test_bad_proof_rejected() {
        let mut chain = build_chain(2);
        let pow = ProofOfWork::new(PowConfig::new(2).unwrap());
        let bad = (0..).find(|p| !pow.is_valid(chain[0].proof, *p)).unwrap();
        chain[1].proof = bad;
        assert!(matches!(
            validator().validate_chain(&chain),
            Err(ValidationError::InvalidProof { index: 2, .. })
        ));
    }

    #[test]
    fn test_index_gap_rejected() {
        let mut chain = build_chain(3);
        chain.remove(1);
        assert!(matches!(
            validator().validate_chain(&chain),
            Err(ValidationError::InvalidIndex { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_invalid_transaction_rejected() {
        let mut chain = build_chain(2);
        chain[1].transactions[0].amount = -5.0;
        // Re-link is not needed: the last block has no successor.
        assert!(matches!(
            validator().validate_chain(&chain),
            Err(ValidationError::InvalidTransaction { index: 2, .. })
        ));
    }

    #[test]
    fn test_higher_difficulty_rejects_easy_chain() {
        let chain = build_chain(4);
        let strict = ChainValidator::new(ProofOfWork::new(PowConfig::new(8).unwrap()));
        assert!(!strict.is_valid_chain(&chain));
    }
}
