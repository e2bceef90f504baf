//! REST API exposing a node over HTTP.
//!
//! | route                    | node operation              |
//! |--------------------------|-----------------------------|
//! | `POST /transactions/new` | [`Node::submit_transaction`] |
//! | `GET  /mine`             | [`Node::mine`]               |
//! | `GET  /chain`            | [`Node::chain_response`]     |
//! | `POST /nodes/register`   | [`Node::register_peers`]     |
//! | `GET  /nodes/resolve`    | [`Node::resolve_conflicts`]  |
//! | `GET  /stats`            | [`Node::stats`]              |

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use powchain_chain::{ChainFetcher, ChainResponse, Node, NodeError, PoolError, ResolverState};
use powchain_core::{Block, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Node(#[from] NodeError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Node(e) if e.is_malformed_input() => StatusCode::BAD_REQUEST,
            ApiError::Node(NodeError::NothingToMine) => StatusCode::BAD_REQUEST,
            ApiError::Node(NodeError::Pool(PoolError::PoolFull(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Node(NodeError::Superseded { .. } | NodeError::Pow(_)) => {
                StatusCode::CONFLICT
            }
            ApiError::Node(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Node(e) = &self {
            if e.is_fatal() {
                error!(error = %e, "fatal ledger error");
            }
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionAccepted {
    pub message: String,
    pub index: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockForged {
    pub message: String,
    #[serde(flatten)]
    pub block: Block,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodes {
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesRegistered {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Resolved {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Stats {
    pub node_id: String,
    pub length: usize,
    pub last_hash: String,
    pub pending_transactions: usize,
    pub peers: usize,
    pub difficulty: usize,
    pub resolving: bool,
}

/// Build the API router around a shared node.
pub fn router<F: ChainFetcher + 'static>(node: Arc<Node<F>>) -> Router {
    Router::new()
        .route("/transactions/new", post(new_transaction::<F>))
        .route("/mine", get(mine::<F>))
        .route("/chain", get(full_chain::<F>))
        .route("/nodes/register", post(register_nodes::<F>))
        .route("/nodes/resolve", get(resolve::<F>))
        .route("/stats", get(stats::<F>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(node)
}

async fn new_transaction<F: ChainFetcher>(
    State(node): State<Arc<Node<F>>>,
    payload: Result<Json<Transaction>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionAccepted>), ApiError> {
    let Json(tx) = payload?;
    let index = node.submit_transaction(tx)?;
    Ok((
        StatusCode::CREATED,
        Json(TransactionAccepted {
            message: format!("Transaction will be added to Block {index}"),
            index,
        }),
    ))
}

async fn mine<F: ChainFetcher>(
    State(node): State<Arc<Node<F>>>,
) -> Result<Json<BlockForged>, ApiError> {
    let block = node.mine().await?;
    Ok(Json(BlockForged {
        message: "New Block Forged".to_string(),
        block,
    }))
}

async fn full_chain<F: ChainFetcher>(State(node): State<Arc<Node<F>>>) -> Json<ChainResponse> {
    Json(node.chain_response())
}

async fn register_nodes<F: ChainFetcher>(
    State(node): State<Arc<Node<F>>>,
    payload: Result<Json<RegisterNodes>, JsonRejection>,
) -> Result<(StatusCode, Json<NodesRegistered>), ApiError> {
    let Json(request) = payload?;
    node.register_peers(&request.nodes)?;
    Ok((
        StatusCode::CREATED,
        Json(NodesRegistered {
            message: "New nodes have been added".to_string(),
            total_nodes: node.peers(),
        }),
    ))
}

async fn resolve<F: ChainFetcher>(
    State(node): State<Arc<Node<F>>>,
) -> Result<Json<Resolved>, ApiError> {
    let outcome = node.resolve_conflicts().await?;
    let message = if outcome.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    info!(replaced = outcome.replaced, length = outcome.chain.len(), "{message}");
    Ok(Json(Resolved {
        message: message.to_string(),
        replaced: outcome.replaced,
        length: outcome.chain.len(),
        chain: outcome.chain,
    }))
}

async fn stats<F: ChainFetcher>(State(node): State<Arc<Node<F>>>) -> Json<Stats> {
    let stats = node.stats();
    Json(Stats {
        node_id: stats.node_id,
        length: stats.length,
        last_hash: stats.last_hash,
        pending_transactions: stats.pending_transactions,
        peers: stats.peers,
        difficulty: stats.difficulty,
        resolving: stats.resolver == ResolverState::Resolving,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use powchain_chain::{FetchError, NodeConfig};
    use powchain_consensus::PowConfig;
    use serde_json::{json, Value};
    use std::future::Future;
    use tower::ServiceExt;

    struct NoPeers;

    impl ChainFetcher for NoPeers {
        fn fetch_chain(
            &self,
            peer: &str,
        ) -> impl Future<Output = Result<ChainResponse, FetchError>> + Send {
            let err = FetchError::Unreachable {
                peer: peer.to_string(),
                reason: "offline".to_string(),
            };
            async move { Err(err) }
        }
    }

    fn app() -> (Router, Arc<Node<NoPeers>>) {
        let config = NodeConfig {
            pow: PowConfig::new(2).unwrap(),
            ..NodeConfig::default()
        };
        let node = Arc::new(Node::new(config, NoPeers));
        (router(Arc::clone(&node)), node)
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_chain_endpoint() {
        let (app, _) = app();
        let (status, body) = call(&app, get("/chain")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["index"], 1);
        assert_eq!(body["chain"][0]["previous_hash"], "1");
        assert_eq!(body["chain"][0]["proof"], 100);
    }

    #[tokio::test]
    async fn test_submit_then_mine() {
        let (app, node) = app();

        let tx = json!({"sender": "A", "recipient": "B", "amount": 5});
        let (status, body) = call(&app, post_json("/transactions/new", tx)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 2);
        assert_eq!(body["message"], "Transaction will be added to Block 2");

        let (status, body) = call(&app, get("/mine")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "New Block Forged");
        assert_eq!(body["index"], 2);
        assert_eq!(body["transactions"], json!([{"sender": "A", "recipient": "B", "amount": 5.0}]));
        assert_eq!(body["previous_hash"], node.chain()[0].digest());
        assert!(node.pending_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_transaction_rejected() {
        let (app, node) = app();

        for bad in [
            json!({"sender": "A", "recipient": "B"}),
            json!({"sender": "A", "recipient": "B", "amount": "five"}),
            json!({"sender": "", "recipient": "B", "amount": 1}),
            json!({"sender": "A", "recipient": "B", "amount": -1}),
        ] {
            let (status, body) = call(&app, post_json("/transactions/new", bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());
        }
        assert!(node.pending_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_register_nodes() {
        let (app, _) = app();

        let body = json!({"nodes": ["http://127.0.0.1:5001", "127.0.0.1:5001", "127.0.0.1:5002"]});
        let (status, body) = call(&app, post_json("/nodes/register", body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["total_nodes"], json!(["127.0.0.1:5001", "127.0.0.1:5002"]));

        let (status, _) = call(&app, post_json("/nodes/register", json!({"nodes": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, post_json("/nodes/register", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_with_unreachable_peers() {
        let (app, node) = app();
        node.register_peers(&["10.255.255.1:5000"]).unwrap();

        let (status, body) = call(&app, get("/nodes/resolve")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["replaced"], false);
        assert_eq!(body["message"], "Our chain is authoritative");
        assert_eq!(body["length"], 1);
    }

    #[tokio::test]
    async fn test_mine_refused_without_transactions() {
        let config = NodeConfig {
            pow: PowConfig::new(2).unwrap(),
            require_transactions: true,
            ..NodeConfig::default()
        };
        let app = router(Arc::new(Node::new(config, NoPeers)));

        let (status, body) = call(&app, get("/mine")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no pending transactions to mine");
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, node) = app();
        let (status, body) = call(&app, get("/stats")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node_id"], node.id());
        assert_eq!(body["length"], 1);
        assert_eq!(body["difficulty"], 2);
        assert_eq!(body["resolving"], false);
    }
}
