//! # Neuromesh Protocol
//!
//! Wire envelope definitions for the neuromesh P2P network: the canonical
//! `Message` framing (magic + kind + length-prefixed payload) shared by every
//! node, independent of what carries the bytes (TCP stream, QUIC datagram,
//! in-process channel for tests).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod version;

pub use error::{ProtocolError, Result};
pub use messages::{Message, MessageKind, MessagePayload};
pub use version::{Version, PROTOCOL_VERSION};

/// Magic bytes identifying neuromesh protocol messages.
pub const MAGIC: [u8; 4] = *b"NMSH";

/// Maximum message size in bytes (16 MB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
