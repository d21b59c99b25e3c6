//! # Neuromesh Numeric Backend
//!
//! Allocates and runs fixed-architecture feedforward networks on behalf of
//! the Agent Manager. A SIMD-accelerated implementation is preferred and
//! probed at startup; if the host doesn't benefit from it, a scalar
//! implementation with identical semantics is used instead.
//!
//! ## Example
//!
//! ```rust
//! use neuromesh_backend::{init_backend, Activation, NetworkConfig, NetworkKind};
//!
//! let backend = init_backend(1_000_000);
//! let handle = backend
//!     .allocate_network(&NetworkConfig {
//!         network_kind: NetworkKind::Mlp,
//!         layer_sizes: vec![2, 4, 1],
//!         seed: 7,
//!         activation: Activation::Sigmoid,
//!         learning_rate: 0.3,
//!     })
//!     .unwrap();
//! let output = backend.forward(handle, &[0.1, 0.9]).unwrap();
//! assert_eq!(output.len(), 1);
//! backend.release(handle).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod dot;
mod error;
mod network;
mod store;

use std::sync::Arc;

pub use backend::{NumericBackend, ScalarBackend, SimdBackend};
pub use config::{Activation, NetworkConfig, NetworkKind};
pub use dot::simd_available;
pub use error::{BackendError, Result};
pub use network::{Sample, TrainingOutcome};
pub use store::NetworkHandle;

/// Selects and constructs the preferred backend for this host: `SimdBackend`
/// when `simd_available()` returns true, `ScalarBackend` otherwise. Both
/// share the same `capacity_elements` arena bound.
#[must_use]
pub fn init_backend(capacity_elements: usize) -> Arc<dyn NumericBackend> {
    if simd_available() {
        tracing::info!(capacity_elements, "selected SIMD numeric backend");
        Arc::new(SimdBackend::new(capacity_elements))
    } else {
        tracing::info!(capacity_elements, "selected scalar numeric backend");
        Arc::new(ScalarBackend::new(capacity_elements))
    }
}
