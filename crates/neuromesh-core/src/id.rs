//! Opaque identifier types used across the mesh.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 16-byte opaque identifier, hex-encoded for display and wire transport.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawId([u8; 16]);

impl RawId {
    /// The length of a `RawId` in bytes.
    pub const LEN: usize = 16;

    /// Creates a `RawId` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of this identifier.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates the null (all-zero) identifier.
    #[must_use]
    pub const fn null() -> Self {
        Self([0u8; 16])
    }

    /// Returns true if this is the null identifier.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 16]
    }

    /// Generates a random identifier.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl TryFrom<&[u8]> for RawId {
    type Error = crate::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != Self::LEN {
            return Err(crate::Error::invalid_input(
                "bytes",
                format!("expected {} bytes, got {}", Self::LEN, bytes.len()),
            ));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

macro_rules! define_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(RawId);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(RawId::generate())
            }

            /// Wraps a raw identifier.
            #[must_use]
            pub const fn from_raw(raw: RawId) -> Self {
                Self(raw)
            }

            /// Returns the underlying raw identifier.
            #[must_use]
            pub const fn as_raw(&self) -> RawId {
                self.0
            }

            /// Returns true if this is the null identifier.
            #[must_use]
            pub fn is_null(&self) -> bool {
                self.0.is_null()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|e| {
                    crate::Error::invalid_input(stringify!($name), e.to_string())
                })?;
                Ok(Self(RawId::try_from(bytes.as_slice())?))
            }
        }
    };
}

define_id!(AgentId, "Identifies a single neural agent owned by the Agent Manager.");
define_id!(NodeId, "Identifies a mesh peer / node, derived from its identity public key.");
define_id!(MessageId, "Identifies a wire envelope, unique per source node.");
define_id!(TransactionId, "Identifies a consensus transaction.");
define_id!(BlockId, "Identifies a consensus block.");
define_id!(HandleId, "Identifies an allocated numeric backend network, independent of the agent that owns it.");

impl NodeId {
    /// Deterministically derives a `NodeId` from a public key's raw bytes
    /// (the SHA-256 digest truncated to 16 bytes), so the same identity
    /// always maps to the same node id.
    #[must_use]
    pub fn from_public_key_bytes(bytes: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(bytes);
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&digest[..16]);
        Self(RawId::from_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_generate_is_unique() {
        let a = AgentId::generate();
        let b = AgentId::generate();
        assert_ne!(a, b);
        assert!(!a.is_null());
    }

    #[test]
    fn raw_id_null() {
        let id = RawId::null();
        assert!(id.is_null());
        assert_eq!(id.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn node_id_from_public_key_is_deterministic() {
        let a = NodeId::from_public_key_bytes(b"some-public-key-bytes");
        let b = NodeId::from_public_key_bytes(b"some-public-key-bytes");
        let c = NodeId::from_public_key_bytes(b"a-different-key");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_roundtrips_through_display_and_parse() {
        let id = AgentId::generate();
        let parsed: AgentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
