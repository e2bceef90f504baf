//! HTTP node for powchain.
//!
//! Wires a [`powchain_chain::Node`] to an axum router and fetches peer
//! chains over HTTP.

pub mod api;
pub mod config;
pub mod fetcher;

pub use api::{router, ApiError};
pub use config::Args;
pub use fetcher::HttpChainFetcher;
