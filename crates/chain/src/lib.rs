//! Node orchestration for powchain.
//!
//! This crate brings the ledger components together into a node:
//! - **Blockchain**: the append-only, never-empty chain of blocks
//! - **Mempool**: pending transactions waiting for the next block
//! - **Peers**: the registered peer addresses
//! - **Resolver**: longest-valid-chain consensus over a pluggable fetcher
//! - **Node**: one lock around all of the above, plus cancellable mining
//!
//! # Example
//!
//! ```rust,no_run
//! use powchain_chain::{ChainFetcher, ChainResponse, FetchError, Node, NodeConfig};
//! use powchain_core::Transaction;
//! use std::future::Future;
//!
//! struct Offline;
//!
//! impl ChainFetcher for Offline {
//!     fn fetch_chain(
//!         &self,
//!         peer: &str,
//!     ) -> impl Future<Output = Result<ChainResponse, FetchError>> + Send {
//!         let err = FetchError::Unreachable { peer: peer.to_string(), reason: "offline".into() };
//!         async move { Err(err) }
//!     }
//! }
//!
//! # async fn run() -> Result<(), powchain_chain::NodeError> {
//! let node = Node::new(NodeConfig::default(), Offline);
//! node.submit_transaction(Transaction::new("alice", "bob", 5.0).unwrap())?;
//! let block = node.mine().await?;
//! assert_eq!(block.index, 2);
//! # Ok(())
//! # }
//! ```

pub mod blockchain;
pub mod mempool;
pub mod node;
pub mod peers;
pub mod resolver;

// Re-export commonly used types
pub use blockchain::{Blockchain, BlockchainError};
pub use mempool::{PoolConfig, PoolError, TransactionPool};
pub use node::{Node, NodeConfig, NodeError, NodeStats, ResolveOutcome};
pub use peers::{PeerError, PeerSet};
pub use resolver::{
    Candidate, ChainFetcher, ChainResponse, ConsensusResolver, FetchError, ResolutionPass,
    ResolverState,
};
