//! Shared error type for core primitives (ids, codecs, timestamps).

use thiserror::Error;

/// Errors raised by `neuromesh-core` primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided input was invalid.
    #[error("invalid input: {field} - {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: &'static str,
        /// A description of why the input was invalid.
        message: String,
    },

    /// A serialization or decoding error occurred.
    #[error("codec error: {0}")]
    Codec(String),
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new invalid input error.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Creates a new codec error.
    #[must_use]
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display() {
        let err = Error::invalid_input("bytes", "wrong length");
        assert_eq!(err.to_string(), "invalid input: bytes - wrong length");
    }
}
