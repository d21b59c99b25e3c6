//! Protocol error types.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The message is malformed.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The message exceeds size limits.
    #[error("message too large: {size} bytes (max {max})")]
    TooLarge {
        /// The actual size.
        size: usize,
        /// The maximum allowed size.
        max: usize,
    },

    /// Unsupported protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    /// Payload failed to serialize or deserialize.
    #[error("payload codec error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Invalid magic bytes.
    #[error("invalid magic bytes")]
    InvalidMagic,

    /// `hop >= ttl`; the message must not be forwarded further.
    #[error("ttl exceeded: hop {hop} >= ttl {ttl}")]
    TtlExceeded {
        /// The message's current hop count.
        hop: u8,
        /// The message's configured ttl.
        ttl: u8,
    },
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
