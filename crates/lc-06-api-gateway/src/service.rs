//! The axum router and server loop.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use shared_types::Tx;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::errors::GatewayError;
use crate::ports::NodeApi;

type Gateway = Arc<dyn NodeApi>;

/// Build the three-route facade over a node.
pub fn router(node: Gateway) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/stats", get(stats))
        .route("/txs", post(submit_tx))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}

/// Bind and serve the facade until the process exits.
pub async fn serve(addr: &str, node: Gateway) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "http facade listening");
    axum::serve(listener, router(node)).await?;
    Ok(())
}

async fn status() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(node): State<Gateway>) -> impl IntoResponse {
    Json(node.stats())
}

async fn submit_tx(State(node): State<Gateway>, Json(tx): Json<Tx>) -> impl IntoResponse {
    match node.submit_tx(tx) {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(error) => {
            debug!(%error, "transaction rejected at the facade");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": error.to_string() })),
            )
        }
    }
}
