//! Longest-valid-chain conflict resolution.
//!
//! The resolver asks every known peer for its chain, discards anything that
//! cannot be fetched, decoded or validated, and proposes the longest
//! survivor that is strictly longer than the local chain.

use futures::future::join_all;
use powchain_consensus::{ChainValidator, ValidationError};
use powchain_core::Block;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Reasons a peer's chain was left out of a resolution pass.
#[derive(Debug, Error, PartialEq)]
pub enum FetchError {
    #[error("peer {peer} is unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} sent malformed data: {reason}")]
    Malformed { peer: String, reason: String },

    #[error("peer {peer} sent an invalid chain: {source}")]
    InvalidChain {
        peer: String,
        #[source]
        source: ValidationError,
    },
}

/// The `{chain, length}` document a node serves for its whole ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainResponse {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

/// Capability to download a peer's full chain.
///
/// The server plugs in an HTTP implementation; tests use in-memory fakes.
pub trait ChainFetcher: Send + Sync {
    fn fetch_chain(
        &self,
        peer: &str,
    ) -> impl Future<Output = Result<ChainResponse, FetchError>> + Send;
}

/// Observable state of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    Resolving,
}

/// A peer chain that beat the local one.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub peer: String,
    pub chain: Vec<Block>,
}

/// Holds the resolver in [`ResolverState::Resolving`] until dropped.
pub struct ResolutionPass<'a> {
    _guard: MutexGuard<'a, ()>,
    resolving: &'a AtomicBool,
}

impl Drop for ResolutionPass<'_> {
    fn drop(&mut self) {
        self.resolving.store(false, Ordering::SeqCst);
    }
}

/// Fetches, validates and ranks peer chains.
pub struct ConsensusResolver<F> {
    fetcher: F,
    validator: ChainValidator,
    pass: Mutex<()>,
    resolving: AtomicBool,
}

impl<F: ChainFetcher> ConsensusResolver<F> {
    pub fn new(fetcher: F, validator: ChainValidator) -> Self {
        Self {
            fetcher,
            validator,
            pass: Mutex::new(()),
            resolving: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ResolverState {
        if self.resolving.load(Ordering::SeqCst) {
            ResolverState::Resolving
        } else {
            ResolverState::Idle
        }
    }

    /// Enter the Resolving state, waiting for any pass already in progress.
    pub async fn begin(&self) -> ResolutionPass<'_> {
        let guard = self.pass.lock().await;
        self.resolving.store(true, Ordering::SeqCst);
        ResolutionPass {
            _guard: guard,
            resolving: &self.resolving,
        }
    }

    /// Fetch one peer's chain and check it end to end.
    pub async fn fetch_valid_chain(&self, peer: &str) -> Result<Vec<Block>, FetchError> {
        let response = self.fetcher.fetch_chain(peer).await?;

        if response.length != response.chain.len() {
            return Err(FetchError::Malformed {
                peer: peer.to_string(),
                reason: format!(
                    "declared length {} but sent {} blocks",
                    response.length,
                    response.chain.len()
                ),
            });
        }

        self.validator
            .validate_chain(&response.chain)
            .map_err(|source| FetchError::InvalidChain {
                peer: peer.to_string(),
                source,
            })?;

        Ok(response.chain)
    }

    /// Query all `peers` concurrently and return the longest valid chain
    /// strictly longer than `local_len`, if any.
    ///
    /// Among equally long winners the first peer in `peers` order is kept.
    pub async fn best_candidate(&self, peers: &[String], local_len: usize) -> Option<Candidate> {
        let results = join_all(peers.iter().map(|peer| self.fetch_valid_chain(peer))).await;

        let mut best: Option<Candidate> = None;
        for (peer, result) in peers.iter().zip(results) {
            let chain = match result {
                Ok(chain) => chain,
                Err(err) => {
                    warn!(peer = %peer, error = %err, "skipping peer");
                    continue;
                }
            };

            let longest = best.as_ref().map_or(local_len, |c| c.chain.len());
            debug!(peer = %peer, length = chain.len(), longest, "peer chain is valid");
            if chain.len() > longest {
                best = Some(Candidate {
                    peer: peer.clone(),
                    chain,
                });
            }
        }
        best
    }
}
