//! Ed25519 signing identity for nodes and agents.

use crate::{PublicKey, Signature, NAMESPACE};
use commonware_cryptography::{ed25519, PrivateKeyExt, Signer};

/// A signing identity backed by an Ed25519 private key.
#[derive(Clone)]
pub struct Keypair {
    private_key: ed25519::PrivateKey,
}

impl Keypair {
    /// Generates a new random keypair.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut seed = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut seed);
        Self {
            private_key: ed25519::PrivateKey::from_seed(u64::from_le_bytes(seed)),
        }
    }

    /// Deterministically derives a keypair from a seed. Useful for validator bootstrapping
    /// and tests that need stable identities across runs.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            private_key: ed25519::PrivateKey::from_seed(seed),
        }
    }

    /// Returns the public key for this keypair.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_inner(self.private_key.public_key())
    }

    /// Signs a message under this crate's namespace.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_inner(self.private_key.sign(Some(NAMESPACE), message))
    }

    /// Verifies a signature produced by `sign` against this keypair's public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is invalid.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> crate::Result<()> {
        self.public_key().verify(message, signature)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_generate_is_unique() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let message = b"spawn agent A";
        let signature = kp.sign(message);
        assert!(kp.verify(message, &signature).is_ok());
    }

    #[test]
    fn keypair_rejects_tampered_message() {
        let kp = Keypair::generate();
        let signature = kp.sign(b"message 1");
        assert!(kp.verify(b"message 2", &signature).is_err());
    }

    #[test]
    fn from_seed_is_deterministic() {
        let a = Keypair::from_seed(7);
        let b = Keypair::from_seed(7);
        assert_eq!(a.public_key(), b.public_key());
    }
}
