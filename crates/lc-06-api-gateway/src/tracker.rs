//! Tracker address-book client.
//!
//! The tracker is an external collaborator holding the deployment's address
//! book: `GET /nodes` serves it, `POST /nodes` replaces it wholesale (the
//! deployment tooling publishes once at rollout). Payloads are opaque JSON
//! from the tracker's point of view.

use serde::{Deserialize, Serialize};
use shared_types::{NodeId, NodeInfo};

use crate::errors::GatewayError;

/// The address-book document as served by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesDocument {
    /// Every node in the deployment.
    pub nodes: Vec<NodeInfo>,
}

/// Fetch the deployment's address book.
pub async fn download_nodes_info(tracker_url: &str) -> Result<Vec<NodeInfo>, GatewayError> {
    let response = reqwest::get(format!("{tracker_url}/nodes")).await?;
    let document: NodesDocument = response.json().await?;
    Ok(document.nodes)
}

/// Publish a full address book, replacing the tracker's current one.
pub async fn publish_nodes_info(
    tracker_url: &str,
    nodes: Vec<NodeInfo>,
) -> Result<(), GatewayError> {
    reqwest::Client::new()
        .post(format!("{tracker_url}/nodes"))
        .json(&NodesDocument { nodes })
        .send()
        .await?;
    Ok(())
}

/// Find one node's entry in a downloaded address book.
pub fn get_node_info(nodes: &[NodeInfo], id: NodeId) -> Option<&NodeInfo> {
    nodes.iter().find(|node| node.id == id)
}
