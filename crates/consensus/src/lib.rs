//! Proof of Work consensus for powchain.
//!
//! This crate provides:
//! - The proof-of-work puzzle: mining (optionally cancellable) and verification
//! - Whole-chain validation (genesis shape, index continuity, hash links, proofs)
//!
//! # Example
//!
//! ```rust
//! use powchain_consensus::{ChainValidator, PowConfig, ProofOfWork};
//! use powchain_core::Block;
//!
//! let pow = ProofOfWork::new(PowConfig::new(2).unwrap());
//! let genesis = Block::genesis();
//!
//! // Seal a block on top of genesis
//! let proof = pow.mine(genesis.proof);
//! let block = Block::new(2, proof, genesis.digest(), vec![]);
//!
//! // Verify the resulting chain
//! let validator = ChainValidator::new(pow);
//! assert!(validator.is_valid_chain(&[genesis, block]));
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{PowConfig, PowError, ProofOfWork, StopSignal};
pub use validator::{ChainValidator, ValidationError};
