//! # Neuromesh Core
//!
//! Shared identifier, timestamp, error, and codec-trait primitives used by
//! every other crate in the neuromesh workspace.
//!
//! ## Example
//!
//! ```rust
//! use neuromesh_core::{AgentId, Timestamp};
//!
//! let id = AgentId::generate();
//! let spawned_at = Timestamp::now();
//! assert!(!id.is_null());
//! assert!(spawned_at.as_millis() > 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod timestamp;
pub mod traits;

pub use error::{Error, Result};
pub use id::{AgentId, BlockId, HandleId, MessageId, NodeId, TransactionId};
pub use timestamp::Timestamp;
pub use traits::{ContentAddressed, FromBytes, ToBytes};
