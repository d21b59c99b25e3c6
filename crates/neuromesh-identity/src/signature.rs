//! Ed25519 signature type.

use commonware_cryptography::ed25519;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An Ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519::Signature,
}

impl Signature {
    pub(crate) fn from_inner(inner: ed25519::Signature) -> Self {
        Self { inner }
    }

    pub(crate) fn as_inner(&self) -> &ed25519::Signature {
        &self.inner
    }

    /// Returns the raw bytes of this signature.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_ref()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.as_bytes()[..8]))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.as_bytes()))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 64 {
            return Err(serde::de::Error::custom("invalid signature length"));
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(Self {
            inner: ed25519::Signature::from(ed25519_consensus::Signature::from(arr)),
        })
    }
}

/// A hex-string encoded signature, used where a plain-JSON field is preferred
/// over the binary-friendly [`Signature`] (consensus transactions, votes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableSignature(pub String);

impl SerializableSignature {
    /// Creates from a hex string.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Creates from a [`Signature`].
    #[must_use]
    pub fn from_signature(sig: &Signature) -> Self {
        Self(hex::encode(sig.as_bytes()))
    }

    /// Returns the hex string as a reference.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Converts back to a [`Signature`].
    ///
    /// # Errors
    ///
    /// Returns an error if the hex string is malformed or not 64 bytes.
    pub fn to_signature(&self) -> crate::Result<Signature> {
        let bytes = hex::decode(&self.0).map_err(|_| crate::IdentityError::InvalidSignature)?;
        if bytes.len() != 64 {
            return Err(crate::IdentityError::InvalidSignature);
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(Signature {
            inner: ed25519::Signature::from(ed25519_consensus::Signature::from(arr)),
        })
    }
}

impl fmt::Display for SerializableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keypair;

    #[test]
    fn signature_serde_json_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello");
        let json = serde_json::to_string(&sig).unwrap();
        let sig2: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn serializable_signature_from_signature() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello");
        let wire = SerializableSignature::from_signature(&sig);
        assert_eq!(wire.as_hex().len(), 128);
    }
}
