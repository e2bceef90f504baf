//! HTTP implementation of [`ChainFetcher`].

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{header, Request, StatusCode};
use hyper_util::rt::TokioIo;
use powchain_chain::{ChainFetcher, ChainResponse, FetchError};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Downloads `GET /chain` from peers over plain HTTP/1.1.
#[derive(Debug, Clone)]
pub struct HttpChainFetcher {
    timeout: Duration,
}

impl HttpChainFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpChainFetcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl ChainFetcher for HttpChainFetcher {
    fn fetch_chain(
        &self,
        peer: &str,
    ) -> impl Future<Output = Result<ChainResponse, FetchError>> + Send {
        let peer = peer.to_string();
        let timeout = self.timeout;
        async move {
            let result = tokio::time::timeout(timeout, get_chain(&peer)).await;
            match result {
                Ok(result) => result,
                Err(_) => Err(FetchError::Unreachable {
                    reason: format!("no response within {timeout:?}"),
                    peer,
                }),
            }
        }
    }
}

async fn get_chain(peer: &str) -> Result<ChainResponse, FetchError> {
    let unreachable = |reason: String| FetchError::Unreachable {
        peer: peer.to_string(),
        reason,
    };
    let malformed = |reason: String| FetchError::Malformed {
        peer: peer.to_string(),
        reason,
    };

    let authority = if peer.contains(':') {
        peer.to_string()
    } else {
        format!("{peer}:80")
    };
    let stream = TcpStream::connect(&authority)
        .await
        .map_err(|e| unreachable(e.to_string()))?;

    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| unreachable(e.to_string()))?;
    let peer_name = peer.to_string();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(peer = %peer_name, error = %e, "peer connection closed with error");
        }
    });

    let request = Request::builder()
        .uri("/chain")
        .header(header::HOST, peer)
        .header(header::ACCEPT, "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| unreachable(e.to_string()))?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| unreachable(e.to_string()))?;

    if response.status() != StatusCode::OK {
        return Err(malformed(format!("unexpected status {}", response.status())));
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| unreachable(e.to_string()))?
        .to_bytes();

    serde_json::from_slice(&body).map_err(|e| malformed(e.to_string()))
}
