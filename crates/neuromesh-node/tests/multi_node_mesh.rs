//! Multi-node integration tests.
//!
//! The only transport medium this workspace implements is
//! `InProcessNetwork`, so a "multi-node mesh" here is multiple
//! `Coordinator`s in one process sharing one network handle, each with its
//! own identity, agent manager, and (optionally) `MeshRuntime`.

use neuromesh_coordinator::{Coordinator, CoordinatorConfig};
use neuromesh_identity::Keypair;
use neuromesh_node::mesh::MeshRuntime;
use neuromesh_p2p::InProcessNetwork;
use neuromesh_topology::{CandidateInfo, TopologyConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn node(network: &InProcessNetwork, seed: u64, enable_p2p: bool) -> Arc<Coordinator> {
    let config = CoordinatorConfig {
        enable_p2p,
        ..CoordinatorConfig::default()
    };
    Coordinator::new(config, Keypair::from_seed(seed), network.clone()).unwrap()
}

#[tokio::test]
async fn two_nodes_connect_over_a_shared_in_process_network() {
    let network = InProcessNetwork::new();
    let node_a = node(&network, 1, true);
    let node_b = node(&network, 2, true);

    let public_key_b = Keypair::from_seed(2).public_key();
    let connected_id = node_a.connect(addr(9200), public_key_b).await.unwrap();
    assert_eq!(connected_id, node_b.node_id());

    let peers = node_a.peers();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].id, node_b.node_id());
}

#[tokio::test]
async fn connect_fails_when_p2p_is_disabled() {
    let network = InProcessNetwork::new();
    let node_a = node(&network, 1, false);
    let public_key_b = Keypair::from_seed(2).public_key();

    let result = node_a.connect(addr(9201), public_key_b).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn mesh_runtime_topology_routes_to_a_recorded_peer() {
    let network = InProcessNetwork::new();
    let node_a = node(&network, 3, true);
    let node_b = node(&network, 4, true);

    let public_key_b = Keypair::from_seed(4).public_key();
    node_a.connect(addr(9300), public_key_b).await.unwrap();

    let runtime = MeshRuntime::new(Arc::clone(&node_a), TopologyConfig::default());
    let topology = runtime.topology();

    let peers = node_a.peers_with_connections();
    assert_eq!(peers.len(), 1);
    {
        let mut topology = topology.lock();
        let (peer, connection) = &peers[0];
        topology.record_candidate(CandidateInfo::from_peer(peer, connection, 1));
        topology.recompute_routing();
    }

    let route = topology.lock().route_to(node_b.node_id()).unwrap();
    assert_eq!(route, Some(node_b.node_id()));
}

#[tokio::test(start_paused = true)]
async fn mesh_runtime_spawn_handles_can_be_joined_after_abort() {
    let network = InProcessNetwork::new();
    let node_a = node(&network, 5, true);

    let runtime = MeshRuntime::new(Arc::clone(&node_a), TopologyConfig::default());
    let handles = runtime.spawn(Duration::from_millis(50));
    assert_eq!(handles.len(), 2);

    tokio::time::advance(Duration::from_millis(200)).await;
    for handle in handles {
        handle.abort();
        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
