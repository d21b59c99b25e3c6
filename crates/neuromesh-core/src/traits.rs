//! Shared codec and content-addressing traits.

use crate::Result;

/// A trait for types that can be serialized to bytes.
pub trait ToBytes {
    /// Serializes the value to bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

/// A trait for types that can be deserialized from bytes.
pub trait FromBytes: Sized {
    /// Deserializes a value from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be deserialized.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// A trait for types that have a content-based identifier.
pub trait ContentAddressed {
    /// The identifier type returned by `content_id`.
    type Id;

    /// Returns the content identifier of this value.
    fn content_id(&self) -> Self::Id;
}
