//! # Health, Readiness, and Metrics Surface
//!
//! The small HTTP surface SPEC_FULL.md §10.4 asks the node binary to carry so
//! core crates stay free of this ambient concern:
//!
//! - `/healthz` — liveness: is the process running at all?
//! - `/readyz` — readiness: has the Agent Manager, and every subsystem this
//!   node enabled, finished starting?
//! - `/status` — a JSON snapshot of `Coordinator::snapshot_metrics()` and
//!   `Coordinator::snapshot_health()`, for operators and dashboards. Not a
//!   Prometheus exposition surface; a plain JSON document.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::Router;
//! use neuromesh_node::health::{health_routes, HealthState};
//!
//! let health_state = HealthState::new(coordinator, topology);
//! health_state.set_ready(true);
//!
//! let app: Router<()> = health_routes(health_state);
//! ```

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use neuromesh_coordinator::{Coordinator, HealthSnapshot};
use neuromesh_topology::Topology;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Liveness probe response. The process is up; nothing more is asserted.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    /// Always `"up"`.
    pub status: &'static str,
    /// Uptime in seconds since this `HealthState` was created.
    pub uptime_seconds: u64,
}

/// Readiness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// `"ready"` once every enabled subsystem has finished starting,
    /// `"starting"` otherwise.
    pub status: &'static str,
}

/// Status/metrics snapshot response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Process uptime in seconds.
    pub uptime_seconds: u64,
    /// Composite agent/mesh/consensus health snapshot.
    pub health: HealthSnapshot,
}

/// Shared state backing the health routes.
#[derive(Clone)]
pub struct HealthState {
    start_time: Instant,
    ready: Arc<AtomicBool>,
    coordinator: Arc<Coordinator>,
    topology: Arc<Mutex<Topology>>,
}

impl HealthState {
    /// Builds a new, not-yet-ready health state wrapping a running node.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, topology: Arc<Mutex<Topology>>) -> Self {
        Self {
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
            coordinator,
            topology,
        }
    }

    /// Seconds elapsed since this state was created.
    #[must_use]
    pub fn uptime(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Marks the node ready (or not) to accept traffic.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Whether the node has finished starting.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Builds the `/healthz`, `/readyz`, and `/status` routes.
pub fn health_routes<S>(state: HealthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

async fn liveness_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let response = LivenessResponse {
        status: "up",
        uptime_seconds: state.uptime(),
    };
    (StatusCode::OK, Json(response))
}

async fn readiness_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let ready = state.is_ready();
    let response = ReadinessResponse {
        status: if ready { "ready" } else { "starting" },
    };
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(response))
}

async fn status_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mesh = state.topology.lock().metrics();
    let health = state.coordinator.snapshot_health(Some(mesh));
    let response = StatusResponse {
        uptime_seconds: state.uptime(),
        health,
    };
    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::NodeId;
    use neuromesh_coordinator::CoordinatorConfig;
    use neuromesh_identity::Keypair;
    use neuromesh_p2p::InProcessNetwork;
    use neuromesh_topology::TopologyConfig;

    fn test_state() -> HealthState {
        let keypair = Keypair::generate();
        let node_id = NodeId::from_public_key_bytes(keypair.public_key().as_bytes());
        let coordinator =
            Coordinator::new(CoordinatorConfig::default(), keypair, InProcessNetwork::new()).unwrap();
        let topology = Arc::new(Mutex::new(Topology::new(node_id, TopologyConfig::default())));
        HealthState::new(coordinator, topology)
    }

    #[tokio::test]
    async fn liveness_is_always_up() {
        let state = test_state();
        let response = liveness_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_reflects_set_ready() {
        let state = test_state();
        assert!(!state.is_ready());
        state.set_ready(true);
        assert!(state.is_ready());
    }
}
