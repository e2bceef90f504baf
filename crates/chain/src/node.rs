//! A single ledger node: chain, pending pool and peers behind one lock.
//!
//! Every inbound operation goes through [`Node`]. Chain and pool mutations
//! are serialized by a single mutex. The lock is never held across an
//! `.await` or while searching for a proof.

use crate::blockchain::{Blockchain, BlockchainError};
use crate::mempool::{PoolConfig, PoolError, TransactionPool};
use crate::peers::{PeerError, PeerSet};
use crate::resolver::{ChainFetcher, ChainResponse, ConsensusResolver, ResolverState};
use parking_lot::Mutex;
use powchain_consensus::{ChainValidator, PowConfig, PowError, ProofOfWork, StopSignal};
use powchain_core::{Block, Transaction};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Errors surfaced by node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error("blockchain error: {0}")]
    Blockchain(#[from] BlockchainError),

    #[error("mining error: {0}")]
    Pow(#[from] PowError),

    #[error("no pending transactions to mine")]
    NothingToMine,

    #[error("chain tip moved while mining; block {index} was discarded")]
    Superseded { index: u64 },

    #[error("mining task failed: {0}")]
    MiningTask(String),
}

impl NodeError {
    /// Whether the error was caused by bad caller input.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            NodeError::Pool(PoolError::Malformed(_)) | NodeError::Peer(_)
        )
    }

    /// Whether the error means the node's own bookkeeping is broken.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NodeError::Blockchain(BlockchainError::InvariantViolation(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// Node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Proof-of-work difficulty.
    pub pow: PowConfig,
    /// Pending pool limits.
    pub pool: PoolConfig,
    /// Amount paid to this node for each mined block, if any.
    pub mining_reward: Option<f64>,
    /// Refuse to mine while the pool is empty.
    pub require_transactions: bool,
}

/// Result of a consensus pass.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    /// Whether the local chain was swapped for a peer's.
    pub replaced: bool,
    /// The authoritative chain after the pass.
    pub chain: Vec<Block>,
}

/// Point-in-time node statistics.
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub node_id: String,
    pub length: usize,
    pub last_hash: String,
    pub pending_transactions: usize,
    pub peers: usize,
    pub difficulty: usize,
    pub resolver: ResolverState,
}

/// Everything guarded by the node lock.
struct LedgerState {
    chain: Blockchain,
    pool: TransactionPool,
    peers: PeerSet,
}

/// One ledger node.
pub struct Node<F> {
    id: String,
    config: NodeConfig,
    pow: ProofOfWork,
    state: Mutex<LedgerState>,
    resolver: ConsensusResolver<F>,
    /// Shared by every proof search started on the current tip.
    mining_epoch: Mutex<StopSignal>,
}

impl<F: ChainFetcher> Node<F> {
    /// Create a node with a fresh genesis block and a random identifier.
    pub fn new(config: NodeConfig, fetcher: F) -> Self {
        let pow = ProofOfWork::new(config.pow);
        let id = Uuid::new_v4().simple().to_string();
        info!(node_id = %id, difficulty = pow.difficulty(), "node created");

        Self {
            id,
            pow,
            state: Mutex::new(LedgerState {
                chain: Blockchain::new(),
                pool: TransactionPool::with_config(config.pool.clone()),
                peers: PeerSet::new(),
            }),
            resolver: ConsensusResolver::new(fetcher, ChainValidator::new(pow)),
            mining_epoch: Mutex::new(StopSignal::new()),
            config,
        }
    }

    /// Process-lifetime identifier of this node.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn resolver(&self) -> &ConsensusResolver<F> {
        &self.resolver
    }

    /// Queue a transaction. Returns the index of the block expected to hold
    /// it; a consensus swap before the next mine can make that stale.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<u64> {
        let mut state = self.state.lock();
        state.pool.add(tx)?;
        let target = state.chain.last_block().index + 1;
        debug!(target, pending = state.pool.len(), "transaction queued");
        Ok(target)
    }

    /// Mine a block holding every pending transaction.
    ///
    /// The proof search runs on a blocking thread without the node lock. If
    /// the chain tip changes meanwhile (another block was mined or consensus
    /// swapped the chain), the search is stopped or its result discarded and
    /// the pending transactions stay queued.
    pub async fn mine(&self) -> Result<Block> {
        let (last_proof, last_digest, next_index, stop) = {
            let state = self.state.lock();
            if self.config.require_transactions && state.pool.is_empty() {
                return Err(NodeError::NothingToMine);
            }
            let last = state.chain.last_block();
            (
                last.proof,
                last.digest(),
                last.index + 1,
                self.mining_epoch.lock().clone(),
            )
        };

        let pow = self.pow;
        let proof = tokio::task::spawn_blocking(move || pow.mine_until(last_proof, &stop))
            .await
            .map_err(|e| NodeError::MiningTask(e.to_string()))?
            .map_err(|e| {
                warn!(index = next_index, error = %e, "proof search stopped");
                NodeError::from(e)
            })?;

        let block = {
            let mut state = self.state.lock();
            if state.chain.last_block().digest() != last_digest {
                warn!(index = next_index, "chain tip moved while mining, discarding block");
                return Err(NodeError::Superseded { index: next_index });
            }

            let mut transactions = state.pool.drain_for_mining();
            if let Some(amount) = self.config.mining_reward {
                transactions.push(Transaction::reward(self.id.as_str(), amount));
            }
            let block = state
                .chain
                .append_block(proof, last_digest, transactions)
                .map_err(|e| self.fatal(e))?
                .clone();
            // Still under the state lock, so no search can pick up the old
            // epoch after the tip moved.
            self.rotate_mining_epoch();
            block
        };

        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.tx_count(),
            "new block forged"
        );
        Ok(block)
    }

    /// Snapshot of the whole chain.
    pub fn chain(&self) -> Vec<Block> {
        self.state.lock().chain.blocks().to_vec()
    }

    /// The `{chain, length}` document served to peers.
    pub fn chain_response(&self) -> ChainResponse {
        ChainResponse::new(self.chain())
    }

    pub fn chain_len(&self) -> usize {
        self.state.lock().chain.len()
    }

    pub fn last_block(&self) -> Block {
        self.state.lock().chain.last_block().clone()
    }

    /// Snapshot of the pending transactions.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().pool.pending().to_vec()
    }

    /// Register peer addresses. Returns the total number of known peers.
    pub fn register_peers<S: AsRef<str>>(&self, addresses: &[S]) -> Result<usize> {
        let mut state = self.state.lock();
        let added = state.peers.register_all(addresses)?;
        info!(added, total = state.peers.len(), "peers registered");
        Ok(state.peers.len())
    }

    pub fn peers(&self) -> Vec<String> {
        self.state.lock().peers.to_vec()
    }

    /// Run one consensus pass against every registered peer.
    ///
    /// The local chain is replaced only by a valid chain that is strictly
    /// longer, so equal lengths keep the local chain. Pending transactions
    /// survive a replacement and go into a later block.
    pub async fn resolve_conflicts(&self) -> Result<ResolveOutcome> {
        let _pass = self.resolver.begin().await;

        let (peers, local_len) = {
            let state = self.state.lock();
            (state.peers.to_vec(), state.chain.len())
        };
        debug!(peers = peers.len(), local_len, "resolving conflicts");

        let candidate = self.resolver.best_candidate(&peers, local_len).await;

        let mut replaced_by = None;
        let chain = {
            let mut state = self.state.lock();
            if let Some(candidate) = candidate {
                // The chain may have grown while peers were queried.
                if candidate.chain.len() > state.chain.len() {
                    state
                        .chain
                        .replace(candidate.chain)
                        .map_err(|e| self.fatal(e))?;
                    self.rotate_mining_epoch();
                    replaced_by = Some(candidate.peer);
                }
            }
            state.chain.blocks().to_vec()
        };

        if let Some(peer) = &replaced_by {
            info!(peer = %peer, length = chain.len(), "chain replaced by longer peer chain");
        } else {
            debug!(length = chain.len(), "local chain is authoritative");
        }

        Ok(ResolveOutcome {
            replaced: replaced_by.is_some(),
            chain,
        })
    }

    pub fn stats(&self) -> NodeStats {
        let state = self.state.lock();
        NodeStats {
            node_id: self.id.clone(),
            length: state.chain.len(),
            last_hash: state.chain.last_block().digest(),
            pending_transactions: state.pool.len(),
            peers: state.peers.len(),
            difficulty: self.pow.difficulty(),
            resolver: self.resolver.state(),
        }
    }

    /// Stop every proof search on the old tip and start a new epoch.
    ///
    /// Callers hold the state lock; `mine` takes the epoch lock inside it too.
    fn rotate_mining_epoch(&self) {
        let mut epoch = self.mining_epoch.lock();
        epoch.stop();
        *epoch = StopSignal::new();
    }

    fn fatal(&self, err: BlockchainError) -> NodeError {
        error!(node_id = %self.id, error = %err, "ledger invariant broken");
        NodeError::Blockchain(err)
    }
}
