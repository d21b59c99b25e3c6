//! Node-level error type.
//!
//! Per SPEC_FULL.md §7's closing paragraph, library crates never reach for
//! `anyhow`; this binary crate is the one place that does, aggregating
//! crate errors behind it at the process boundary (CLI, config, startup).

use thiserror::Error;

/// Errors raised assembling or running a node, distinct from the
/// library-crate errors `anyhow::Error` wraps at the call site.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The Coordinator could not be constructed.
    #[error("coordinator error: {0}")]
    Coordinator(#[from] neuromesh_coordinator::CoordinatorError),
}

/// A specialized `Result` for node-assembly operations.
pub type Result<T> = std::result::Result<T, NodeError>;
