//! # Neuromesh Coordinator
//!
//! Glues the Agent Manager, P2P Transport, and Consensus Engine behind one
//! control surface. Topology is deliberately not owned here: a caller
//! (`neuromesh-node`) drives it with Transport telemetry and passes the
//! resulting [`neuromesh_topology::MeshMetrics`] into
//! [`Coordinator::snapshot_health`] when it wants a combined view.
//!
//! ```
//! use neuromesh_coordinator::{Coordinator, CoordinatorConfig};
//! use neuromesh_backend::{Activation, NetworkConfig, NetworkKind};
//! use neuromesh_identity::Keypair;
//! use neuromesh_p2p::InProcessNetwork;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let coordinator = Coordinator::new(
//!     CoordinatorConfig::default(),
//!     Keypair::generate(),
//!     InProcessNetwork::new(),
//! )
//! .unwrap();
//!
//! let id = coordinator
//!     .spawn(
//!         NetworkConfig {
//!             network_kind: NetworkKind::Mlp,
//!             layer_sizes: vec![2, 4, 1],
//!             seed: 1,
//!             activation: Activation::Sigmoid,
//!             learning_rate: 0.3,
//!         },
//!         serde_json::json!({}),
//!         false,
//!     )
//!     .await
//!     .unwrap();
//! let output = coordinator.run_inference(id, vec![0.1, 0.9], false).await.unwrap();
//! assert_eq!(output.len(), 1);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod application;
mod config;
mod coordinator;
mod error;
mod health;
mod sink;

pub use application::CoordinatorApplication;
pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::{CoordinatorError, Result};
pub use health::HealthSnapshot;
pub use sink::CoordinatorSink;
