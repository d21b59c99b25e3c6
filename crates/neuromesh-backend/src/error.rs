//! Numeric backend error types.

use thiserror::Error;

/// Errors raised by the numeric backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    /// Allocating the requested architecture would exceed the configured arena bound.
    #[error("out of capacity: requested {requested} elements, {available} available")]
    OutOfCapacity {
        /// Elements the allocation would need.
        requested: usize,
        /// Elements remaining in the arena.
        available: usize,
    },

    /// The handle does not refer to a live network (never allocated, or already released).
    #[error("invalid network handle")]
    Invalid,

    /// An input vector's length did not match the expected dimension.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected vector length.
        expected: usize,
        /// Actual vector length supplied.
        actual: usize,
    },

    /// A blend factor outside `[0, 1]` was supplied to `deserialize_into`.
    #[error("blend factor {0} out of range [0, 1]")]
    InvalidBlend(f32),

    /// A serialized weights blob was truncated or malformed.
    #[error("malformed weights blob: {0}")]
    Malformed(String),

    /// The network architecture itself was invalid (fewer than two layers, or a zero-sized layer).
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),
}

/// A specialized `Result` for numeric backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
