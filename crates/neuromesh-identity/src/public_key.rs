//! Ed25519 public key for verification.

use crate::{IdentityError, Result, Signature, NAMESPACE};
use commonware_cryptography::{ed25519, Verifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An Ed25519 public key for signature verification.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    inner: ed25519::PublicKey,
}

impl PublicKey {
    /// The length of a public key in bytes.
    pub const LEN: usize = 32;

    pub(crate) fn from_inner(inner: ed25519::PublicKey) -> Self {
        Self { inner }
    }

    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not represent a valid public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(IdentityError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        let vk = ed25519_consensus::VerificationKey::try_from(arr)
            .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
        Ok(Self {
            inner: ed25519::PublicKey::from(vk),
        })
    }

    /// Returns the raw bytes of this public key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_ref()
    }

    /// Returns a short identifier (first 8 bytes as hex).
    #[must_use]
    pub fn short_id(&self) -> String {
        hex::encode(&self.as_bytes()[..8])
    }

    /// Verifies a signature against a message, using this crate's signing namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is invalid.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        if self.inner.verify(Some(NAMESPACE), message, signature.as_inner()) {
            Ok(())
        } else {
            Err(IdentityError::InvalidSignature)
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.short_id())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.as_bytes()))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        PublicKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// A hex-string encoded public key, used where a plain-JSON field is preferred
/// over the binary-friendly [`PublicKey`] (consensus transactions, genesis files).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializablePublicKey(pub String);

impl SerializablePublicKey {
    /// Creates from a hex string.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Creates from a [`PublicKey`].
    #[must_use]
    pub fn from_public_key(pk: &PublicKey) -> Self {
        Self(hex::encode(pk.as_bytes()))
    }

    /// Converts back to a [`PublicKey`].
    ///
    /// # Errors
    ///
    /// Returns an error if the hex string is malformed.
    pub fn to_public_key(&self) -> Result<PublicKey> {
        let bytes =
            hex::decode(&self.0).map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
        PublicKey::from_bytes(&bytes)
    }

    /// Returns the hex string as a reference.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerializablePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keypair;

    #[test]
    fn public_key_short_id() {
        let kp = Keypair::generate();
        let pk = kp.public_key();
        assert_eq!(pk.short_id().len(), 16);
    }

    #[test]
    fn public_key_roundtrip() {
        let kp = Keypair::generate();
        let pk1 = kp.public_key();
        let pk2 = PublicKey::from_bytes(pk1.as_bytes()).unwrap();
        assert_eq!(pk1, pk2);
    }

    #[test]
    fn public_key_serde_json() {
        let kp = Keypair::generate();
        let pk = kp.public_key();
        let json = serde_json::to_string(&pk).unwrap();
        let pk2: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, pk2);
    }

    #[test]
    fn serializable_public_key_roundtrip() {
        let kp = Keypair::generate();
        let pk = kp.public_key();
        let wire = SerializablePublicKey::from_public_key(&pk);
        assert_eq!(wire.to_public_key().unwrap(), pk);
    }
}
