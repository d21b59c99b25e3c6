//! # Neuromesh Node
//!
//! The process that wires the Agent Manager, Transport, Topology, and
//! Consensus Engine behind one runnable binary.
//!
//! A neuromesh node is a thin assembly layer over
//! [`neuromesh_coordinator::Coordinator`], which itself owns the Agent
//! Manager, Transport, and Consensus Engine. This crate owns three things
//! `Coordinator` deliberately does not:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     neuromesh-node                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  config        TOML + env-var configuration, validated    │
//! │  mesh          Topology instance, driven by Coordinator's │
//! │                Transport telemetry                        │
//! │  health        /healthz, /readyz, /status (axum)          │
//! │  observability structured logging (tracing)                │
//! │  resilience    retry/circuit-breaker/timeout helpers       │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                     neuromesh_coordinator::Coordinator
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!   Agent Manager          Transport            Consensus Engine
//! ```
//!
//! `neuromesh-topology`'s routing/rebalancing logic "owns no sockets and
//! spawns no tasks" by design; [`mesh::MeshRuntime`] is the caller that feeds
//! it `Coordinator::peers()` and `Coordinator::take_transport_events()`.
//!
//! The only transport medium this codebase implements is
//! `neuromesh_p2p::InProcessNetwork`, so a multi-node mesh here means
//! multiple `Coordinator`s in one process sharing one `InProcessNetwork` —
//! see the "node" entry in this repository's DESIGN.md for the full
//! rationale.
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin neuromesh-node -- --config node.toml
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod mesh;
pub mod observability;
pub mod resilience;
