//! # Mesh Runtime
//!
//! Owns the [`Topology`] instance and drives it from [`Coordinator`]'s
//! Transport telemetry. `neuromesh-topology`'s own documentation is explicit
//! that it "owns no sockets and spawns no tasks" — a caller has to feed it
//! connect/disconnect events and periodically ask it to recompute routing.
//! This module is that caller.

use neuromesh_coordinator::Coordinator;
use neuromesh_p2p::TransportEvent;
use neuromesh_topology::{CandidateInfo, Partition, RebalanceAction, Topology, TopologyConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Wraps a running [`Coordinator`] together with the [`Topology`] instance
/// that decides mesh routing and peer selection on its behalf.
pub struct MeshRuntime {
    coordinator: Arc<Coordinator>,
    topology: Arc<Mutex<Topology>>,
}

impl MeshRuntime {
    /// Builds a mesh runtime for an already-constructed coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, config: TopologyConfig) -> Self {
        let topology = Arc::new(Mutex::new(Topology::new(coordinator.node_id(), config)));
        Self { coordinator, topology }
    }

    /// A clone of the shared `Topology` handle, for the health/status surface.
    #[must_use]
    pub fn topology(&self) -> Arc<Mutex<Topology>> {
        Arc::clone(&self.topology)
    }

    /// Spawns the background tasks that keep `Topology` in sync with
    /// Transport: one consuming `Coordinator::take_transport_events()`, one
    /// ticking `maybe_recompute_routing`/`rebalance`/`detect_partitions` on
    /// `monitoring_interval`. Returns both handles so the caller can join
    /// them on shutdown. No-op (returns an empty vec) if `enable_p2p` is off.
    pub fn spawn(&self, monitoring_interval: Duration) -> Vec<JoinHandle<()>> {
        let Some(events) = self.coordinator.take_transport_events() else {
            debug!("p2p disabled or transport events already taken, mesh runtime idle");
            return Vec::new();
        };

        let mut handles = Vec::new();

        let topology = Arc::clone(&self.topology);
        handles.push(tokio::spawn(async move {
            event_loop(events, topology).await;
        }));

        let topology = Arc::clone(&self.topology);
        let coordinator = Arc::clone(&self.coordinator);
        handles.push(tokio::spawn(async move {
            tick_loop(coordinator, topology, monitoring_interval).await;
        }));

        handles
    }
}

async fn event_loop(
    mut events: tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
    topology: Arc<Mutex<Topology>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::PeerConnected(peer_id) => {
                info!(%peer_id, "peer connected, recording session");
                topology.lock().record_session(peer_id, Duration::ZERO);
            }
            TransportEvent::PeerDisconnected { peer_id, reason } => {
                info!(%peer_id, %reason, "peer disconnected");
                topology.lock().remove_session(peer_id);
            }
            TransportEvent::BroadcastFailed { peer_id, reason } => {
                warn!(%peer_id, %reason, "broadcast delivery failed");
            }
        }
    }
    debug!("transport event stream closed, mesh event loop exiting");
}

async fn tick_loop(coordinator: Arc<Coordinator>, topology: Arc<Mutex<Topology>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;

        let peers = coordinator.peers_with_connections();
        let action: RebalanceAction;
        let partitions: Vec<Partition>;
        {
            let mut topology = topology.lock();
            for (peer, connection) in &peers {
                topology.record_candidate(CandidateInfo::from_peer(peer, connection, peers.len()));
            }
            topology.maybe_recompute_routing();
            action = topology.rebalance();
            partitions = topology.detect_partitions();
        }

        if !action.connect.is_empty() || !action.disconnect.is_empty() {
            debug!(
                connect = action.connect.len(),
                disconnect = action.disconnect.len(),
                "topology rebalance suggests a peer set change"
            );
        }
        if !partitions.is_empty() {
            warn!(count = partitions.len(), "mesh partitions detected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_coordinator::CoordinatorConfig;
    use neuromesh_identity::Keypair;
    use neuromesh_p2p::InProcessNetwork;

    fn build(enable_p2p: bool) -> Arc<Coordinator> {
        let keypair = Keypair::generate();
        let config = CoordinatorConfig {
            enable_p2p,
            ..CoordinatorConfig::default()
        };
        Coordinator::new(config, keypair, InProcessNetwork::new()).unwrap()
    }

    #[test]
    fn new_mesh_runtime_starts_with_zero_density() {
        let coordinator = build(true);
        let runtime = MeshRuntime::new(Arc::clone(&coordinator), TopologyConfig::default());
        assert_eq!(runtime.topology().lock().metrics().density, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_is_noop_without_p2p() {
        let coordinator = build(false);
        let runtime = MeshRuntime::new(coordinator, TopologyConfig::default());
        let handles = runtime.spawn(Duration::from_secs(30));
        assert!(handles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_starts_both_background_tasks_when_p2p_enabled() {
        let coordinator = build(true);
        let runtime = MeshRuntime::new(Arc::clone(&coordinator), TopologyConfig::default());
        let handles = runtime.spawn(Duration::from_secs(30));
        assert_eq!(handles.len(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        for handle in handles {
            handle.abort();
        }
    }
}
