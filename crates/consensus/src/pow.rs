//! Proof of Work consensus implementation.
//!
//! A block's proof is a number `p'` such that the hash of the string
//! `"{p}{p'}"`, where `p` is the previous block's proof, starts with
//! `difficulty` zero hex digits. Finding `p'` takes a linear search, while
//! checking it costs a single hash.

use powchain_core::hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during proof-of-work operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("difficulty must be between 1 and {max} (got {got})")]
    InvalidDifficulty { max: usize, got: usize },

    #[error("proof search was cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
}

pub type Result<T> = std::result::Result<T, PowError>;

/// Proof of Work configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowConfig {
    /// Number of leading zero hex digits a valid proof hash must have.
    pub difficulty: usize,
}

impl PowConfig {
    /// Largest usable difficulty: a 256-bit hash has 64 hex digits.
    pub const MAX_DIFFICULTY: usize = 64;

    /// Create a configuration, rejecting impossible difficulties.
    pub fn new(difficulty: usize) -> Result<Self> {
        if difficulty == 0 || difficulty > Self::MAX_DIFFICULTY {
            return Err(PowError::InvalidDifficulty {
                max: Self::MAX_DIFFICULTY,
                got: difficulty,
            });
        }
        Ok(Self { difficulty })
    }
}

impl Default for PowConfig {
    fn default() -> Self {
        Self { difficulty: 4 }
    }
}

/// Cooperative stop flag for an in-flight proof search.
///
/// Cloning shares the flag, so a consensus pass can stop a search running on
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search observing this signal to give up.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The proof-of-work engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofOfWork {
    config: PowConfig,
}

impl ProofOfWork {
    /// How many candidates are tried between two checks of the stop signal.
    const STOP_CHECK_INTERVAL: u64 = 1024;

    pub fn new(config: PowConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    /// Check whether `candidate` solves the puzzle posed by `last_proof`.
    pub fn is_valid(&self, last_proof: u64, candidate: u64) -> bool {
        let guess = format!("{last_proof}{candidate}");
        hash(guess.as_bytes()).leading_zero_nibbles() >= self.config.difficulty
    }

    /// Search upward from 0 for the first valid proof.
    ///
    /// This never gives up. Prefer [`ProofOfWork::mine_until`] anywhere the
    /// search must be interruptible.
    pub fn mine(&self, last_proof: u64) -> u64 {
        (0..=u64::MAX)
            .find(|candidate| self.is_valid(last_proof, *candidate))
            .unwrap_or(u64::MAX)
    }

    /// Search upward from 0 for the first valid proof, stopping early once
    /// `stop` is raised.
    pub fn mine_until(&self, last_proof: u64, stop: &StopSignal) -> Result<u64> {
        let mut candidate = 0u64;
        loop {
            if candidate % Self::STOP_CHECK_INTERVAL == 0 && stop.is_stopped() {
                return Err(PowError::Cancelled {
                    attempts: candidate,
                });
            }
            if self.is_valid(last_proof, candidate) {
                return Ok(candidate);
            }
            candidate = candidate.wrapping_add(1);
        }
    }
}
