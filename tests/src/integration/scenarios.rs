//! End-to-end scenarios over real localhost TCP.

use std::sync::Arc;
use std::time::Duration;

use primitive_types::U256;
use shared_types::TxType;

use crate::harness::{addresses_on, signed_transfer, start_cluster, wait_for};

const BLOCK_TIME: Duration = Duration::from_millis(300);

/// One shard, three validators: a signed transfer submitted to the leader
/// settles on every replica within a block interval.
#[tokio::test]
async fn test_single_shard_transfer_settles_everywhere() {
    let cluster = start_cluster(3, 3, 47000, BLOCK_TIME).await;
    let chain = cluster.nodes[0].chain().to_string();
    let [alice, bob]: [String; 2] = addresses_on(&cluster.authority, &chain, 2)
        .try_into()
        .unwrap();

    for node in &cluster.nodes {
        node.issue(&alice, U256::from(100));
    }

    let tx = signed_transfer(&alice, &bob, "40");
    cluster.leader_of(&chain).submit_tx(tx.clone()).unwrap();

    assert!(
        wait_for(|| {
            cluster
                .nodes
                .iter()
                .all(|node| node.balance(&alice) == U256::from(60))
        })
        .await
    );

    for node in &cluster.nodes {
        assert_eq!(node.balance(&bob), U256::from(40));
        assert_eq!(node.pending_len(), 0);

        let tip = node.tip().unwrap();
        assert_eq!(tip.header.height, 1);
        assert_eq!(tip.body.txs.len(), 1);
        assert_eq!(tip.body.txs[0].hash, tx.hash);
        // Unanimous committee of three.
        assert_eq!(tip.signatures.len(), 3);
        for signature in &tip.signatures {
            assert!(tip.validate_signature(signature));
        }
    }
}

/// An overdraft submitted through the HTTP facade is rejected with a non-200
/// and never reaches the pool; a valid transfer through the same facade
/// settles.
#[tokio::test]
async fn test_facade_rejects_overdraft_and_accepts_valid_transfer() {
    let cluster = start_cluster(1, 1, 47100, BLOCK_TIME).await;
    let node = cluster.nodes[0].clone();
    let chain = node.chain().to_string();
    let [alice, bob]: [String; 2] = addresses_on(&cluster.authority, &chain, 2)
        .try_into()
        .unwrap();
    node.issue(&alice, U256::from(100));

    let facade = Arc::new(node.clone());
    tokio::spawn(async move {
        lc_06_api_gateway::serve("127.0.0.1:47150", facade).await.ok();
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    let client = reqwest::Client::new();

    // Scenario B: exceeds the balance, rejected at intake.
    let response = client
        .post("http://127.0.0.1:47150/txs")
        .json(&signed_transfer(&alice, &bob, "150"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(node.pending_len(), 0);
    assert_eq!(node.balance(&alice), U256::from(100));

    // Scenario A through the facade.
    let response = client
        .post("http://127.0.0.1:47150/txs")
        .json(&signed_transfer(&alice, &bob, "40"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert!(wait_for(|| node.balance(&alice) == U256::from(60)).await);
    assert_eq!(node.balance(&bob), U256::from(40));

    let stats: serde_json::Value = client
        .get("http://127.0.0.1:47150/stats")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["blockHeight"], 1);
    assert_eq!(stats["totalTxNumber"], 1);
}

/// Cross-shard transfer: the origin shard debits and emits a receipt over
/// the interchange link; the destination shard credits on committing it;
/// both shards' commits are anchored on basechain.
#[tokio::test]
async fn test_cross_shard_settlement_and_basechain_anchor() {
    // basechain {0}, shard_1 {1}, shard_2 {2}, all single-validator.
    let cluster = start_cluster(3, 1, 47200, BLOCK_TIME).await;
    let alice = addresses_on(&cluster.authority, "shard_1", 1).remove(0);
    let bob = addresses_on(&cluster.authority, "shard_2", 1).remove(0);

    let origin = cluster.leader_of("shard_1").clone();
    let destination = cluster.leader_of("shard_2").clone();
    let basechain = cluster.leader_of("basechain").clone();
    origin.issue(&alice, U256::from(100));

    let tx = signed_transfer(&alice, &bob, "40");
    origin.submit_tx(tx.clone()).unwrap();

    // Origin shard: debit only.
    assert!(wait_for(|| origin.balance(&alice) == U256::from(60)).await);
    assert_eq!(origin.balance(&bob), U256::zero());

    // Destination shard: the receipt commits and credits bob.
    assert!(wait_for(|| destination.balance(&bob) == U256::from(40)).await);

    let destination_tip = destination.tip().unwrap();
    let receipt = &destination_tip.body.txs[0];
    assert_eq!(receipt.tx_type, TxType::Receipt);
    match &receipt.data {
        shared_types::TxPayload::Receipt(receipt) => {
            assert_eq!(receipt.original_tx_hash, tx.hash);
            assert_eq!(receipt.to, bob);
            assert_eq!(receipt.amount, "40");
        }
        other => panic!("expected receipt, got {other:?}"),
    }

    // Basechain anchors the shard commits.
    assert!(
        wait_for(|| {
            basechain
                .tip()
                .map(|tip| tip.header.height >= 1)
                .unwrap_or(false)
        })
        .await
    );
    let anchored = basechain.tip().unwrap();
    assert!(anchored
        .body
        .txs
        .iter()
        .all(|tx| tx.tx_type == TxType::ShardCommit));
}

/// With one of four validators offline, the leader cannot reach unanimity;
/// the proposal commits on the strict two-thirds supermajority once the
/// vote deadline passes.
#[tokio::test]
async fn test_supermajority_commit_after_vote_deadline() {
    let cluster =
        crate::harness::start_cluster_subset(4, 4, 47300, BLOCK_TIME, &[0, 1, 2]).await;
    let chain = cluster.nodes[0].chain().to_string();
    let [alice, bob]: [String; 2] = addresses_on(&cluster.authority, &chain, 2)
        .try_into()
        .unwrap();

    for node in &cluster.nodes {
        node.issue(&alice, U256::from(100));
    }

    let tx = signed_transfer(&alice, &bob, "40");
    cluster.leader_of(&chain).submit_tx(tx).unwrap();

    assert!(
        wait_for(|| {
            cluster
                .nodes
                .iter()
                .all(|node| node.balance(&bob) == U256::from(40))
        })
        .await
    );

    // Three of four signatures: short of unanimity, above two thirds.
    let tip = cluster.leader_of(&chain).tip().unwrap();
    assert_eq!(tip.signatures.len(), 3);
}
