//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding wire values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The kind tag did not match the field the caller asked for.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind the caller expected at this position.
        expected: &'static str,
        /// Kind actually present on the wire.
        found: &'static str,
    },

    /// An unknown kind tag byte.
    #[error("invalid kind tag: {0:#04x}")]
    InvalidTag(u8),

    /// A text value that is not valid UTF-8.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// A declared length exceeds the decoder's allocation cap.
    #[error("{kind} length {len} exceeds maximum {max}")]
    LengthExceeded {
        /// Kind of value whose length was excessive.
        kind: &'static str,
        /// Declared length.
        len: u64,
        /// Maximum the decoder accepts.
        max: u64,
    },
}

impl CodecError {
    /// Creates a kind-mismatch error.
    pub fn kind_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::KindMismatch { expected, found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::kind_mismatch("text", "int");
        assert_eq!(err.to_string(), "kind mismatch: expected text, found int");

        let err = CodecError::InvalidTag(0x2a);
        assert!(err.to_string().contains("0x2a"));
    }
}
