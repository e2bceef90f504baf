//! Command-line configuration for the node binary.

use crate::fetcher::HttpChainFetcher;
use anyhow::{Context, Result};
use clap::Parser;
use powchain_chain::{NodeConfig, PoolConfig};
use powchain_consensus::PowConfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "powchain-node")]
#[command(about = "A proof-of-work ledger node", long_about = None)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Leading zero hex digits required of each proof hash
    #[arg(short, long, default_value = "4")]
    pub difficulty: usize,

    /// Pay this node a reward transaction for every mined block
    #[arg(long)]
    pub reward: Option<f64>,

    /// Refuse to mine blocks while no transactions are pending
    #[arg(long)]
    pub require_transactions: bool,

    /// Maximum number of pending transactions
    #[arg(long, default_value = "10000")]
    pub max_pending: usize,

    /// Peer to register at startup (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-peer timeout when fetching chains, in milliseconds
    #[arg(long, default_value = "5000")]
    pub fetch_timeout_ms: u64,
}

impl Args {
    /// Socket address the API listens on.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn node_config(&self) -> Result<NodeConfig> {
        let pow = PowConfig::new(self.difficulty).context("invalid --difficulty")?;
        if let Some(reward) = self.reward {
            anyhow::ensure!(
                reward.is_finite() && reward >= 0.0,
                "--reward must be a non-negative number"
            );
        }
        Ok(NodeConfig {
            pow,
            pool: PoolConfig {
                max_pending: self.max_pending,
            },
            mining_reward: self.reward,
            require_transactions: self.require_transactions,
        })
    }

    pub fn fetcher(&self) -> HttpChainFetcher {
        HttpChainFetcher::new(Duration::from_millis(self.fetch_timeout_ms))
    }
}
