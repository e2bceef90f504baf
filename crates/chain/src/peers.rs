//! The set of peer nodes this node reconciles with.

use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur when registering peers.
#[derive(Debug, Error, PartialEq)]
pub enum PeerError {
    #[error("no peer addresses supplied")]
    NoPeers,

    #[error("invalid peer address: {0:?}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, PeerError>;

/// Known peer addresses, stored as `host:port`.
///
/// Peers are only ever added. There is no discovery, eviction or liveness
/// tracking.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    peers: BTreeSet<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        Self::normalize(address)
            .map(|addr| self.peers.contains(&addr))
            .unwrap_or(false)
    }

    /// Reduce `http://host:port/path` or `host:port` to `host:port`.
    pub fn normalize(address: &str) -> Result<String> {
        let trimmed = address.trim();
        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        let authority = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();

        if authority.is_empty()
            || authority.starts_with(':')
            || authority.chars().any(char::is_whitespace)
        {
            return Err(PeerError::InvalidAddress(address.to_string()));
        }
        Ok(authority.to_string())
    }

    /// Register one address. Returns whether it was new.
    pub fn register(&mut self, address: &str) -> Result<bool> {
        let normalized = Self::normalize(address)?;
        Ok(self.peers.insert(normalized))
    }

    /// Register a batch of addresses, all or nothing.
    ///
    /// Every address is checked before any is inserted. Returns how many were
    /// new.
    pub fn register_all<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<usize> {
        if addresses.is_empty() {
            return Err(PeerError::NoPeers);
        }
        let normalized = addresses
            .iter()
            .map(|a| Self::normalize(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(normalized
            .into_iter()
            .filter(|addr| self.peers.insert(addr.clone()))
            .count())
    }

    /// Peers in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }
}
