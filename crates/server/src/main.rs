//! powchain node entry point.

use anyhow::{Context, Result};
use clap::Parser;
use powchain_chain::Node;
use powchain_server::{router, Args};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let addr = args.listen_addr()?;
    let node = Arc::new(Node::new(args.node_config()?, args.fetcher()));

    if !args.peers.is_empty() {
        node.register_peers(&args.peers)
            .context("invalid --peer address")?;
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, node_id = node.id(), "node listening");

    axum::serve(listener, router(node))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
