//! # Observability Module
//!
//! Structured logging for the node binary, per SPEC_FULL.md §10.1. Metrics
//! are exposed as a plain JSON snapshot by [`crate::health`] rather than a
//! Prometheus exposition surface — there is no `/metrics` scrape endpoint
//! here.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neuromesh_node::observability::init_logging;
//!
//! init_logging("info", true);
//! ```

mod logging;

pub use logging::{init_logging, LogFormat};
