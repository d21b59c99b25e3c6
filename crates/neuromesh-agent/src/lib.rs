//! # Neuromesh Agent Manager
//!
//! Owns every neural agent's lifecycle: spawning a backed network, bounding
//! inference and training by deadline, blending knowledge between agents,
//! and reporting aggregate health. No other crate may mutate an agent's
//! state or backend handle directly — all access goes through
//! [`AgentManager`].
//!
//! ## Example
//!
//! ```rust
//! use neuromesh_agent::{AgentManager, AgentManagerConfig, AgentSpawnConfig};
//! use neuromesh_backend::{init_backend, Activation, NetworkConfig, NetworkKind};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = init_backend(1_000_000);
//! let manager = AgentManager::new(backend, AgentManagerConfig::default());
//! let id = manager
//!     .spawn(AgentSpawnConfig {
//!         network: NetworkConfig {
//!             network_kind: NetworkKind::Mlp,
//!             layer_sizes: vec![2, 4, 1],
//!             seed: 1,
//!             activation: Activation::Sigmoid,
//!             learning_rate: 0.3,
//!         },
//!         metadata: serde_json::json!({}),
//!         agent_id: None,
//!     })
//!     .await
//!     .unwrap();
//! let output = manager.run_inference(id, vec![0.1, 0.9]).await.unwrap();
//! assert_eq!(output.len(), 1);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod manager;
mod metrics;
mod record;
mod state;

pub use config::{AgentManagerConfig, AgentSpawnConfig};
pub use error::{AgentError, Result};
pub use manager::AgentManager;
pub use metrics::ManagerMetrics;
pub use record::AgentSnapshot;
pub use state::AgentState;
