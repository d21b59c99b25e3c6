//! # Neuromesh Identity
//!
//! Node and agent signing identity, built on commonware's Ed25519 primitives.
//!
//! ## Example
//!
//! ```rust
//! use neuromesh_identity::Keypair;
//!
//! let keypair = Keypair::generate();
//! let message = b"spawn agent A";
//! let signature = keypair.sign(message);
//!
//! assert!(keypair.verify(message, &signature).is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod keypair;
mod public_key;
mod signature;

pub use error::{IdentityError, Result};
pub use keypair::Keypair;
pub use public_key::{PublicKey, SerializablePublicKey};
pub use signature::{SerializableSignature, Signature};

/// Domain-separation namespace mixed into every signature produced by this crate.
pub const NAMESPACE: &[u8] = b"_NEUROMESH";
