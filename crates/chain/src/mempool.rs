//! Transaction pool for pending transactions.
//!
//! The pool stores validated transactions, in submission order, until the
//! next mined block takes all of them.

use powchain_core::{Transaction, TransactionError};
use thiserror::Error;

/// Errors that can occur during pool operations.
#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("malformed transaction: {0}")]
    Malformed(#[from] TransactionError),

    #[error("transaction pool is full (capacity: {0})")]
    PoolFull(usize),
}

pub type Result<T> = std::result::Result<T, PoolError>;

/// Configuration for the transaction pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of pending transactions.
    pub max_pending: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pending: 10_000,
        }
    }
}

/// Pending transactions waiting for the next mined block.
#[derive(Debug, Default)]
pub struct TransactionPool {
    /// Configuration.
    config: PoolConfig,
    /// Pending transactions in submission order.
    pending: Vec<Transaction>,
}

impl TransactionPool {
    /// Create a new pool with default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new pool with the given configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
        }
    }

    /// Get the number of pending transactions.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Validate and queue a transaction.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        tx.validate()?;

        if self.pending.len() >= self.config.max_pending {
            return Err(PoolError::PoolFull(self.config.max_pending));
        }

        self.pending.push(tx);
        Ok(())
    }

    /// Pending transactions, oldest first.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Take every pending transaction, leaving the pool empty.
    ///
    /// Only call this once the block that will hold them has been sealed.
    pub fn drain_for_mining(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }
}
