//! Error types for the protocol crate.

use graphsync_codec::CodecError;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding, decoding, or validating
/// protocol messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A wire value failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The leading message type tag is not in the catalog.
    #[error("unknown message type code: {0}")]
    UnknownTypeCode(u8),

    /// A message frame was empty.
    #[error("empty message frame")]
    EmptyFrame,

    /// A message decoded cleanly but left bytes in the frame.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    /// A chunk arrived out of sequence. Fatal to the transfer.
    #[error("chunk sequence mismatch: expected {expected}, received {received}")]
    SequenceMismatch {
        /// Sequence number the receiver expected next.
        expected: u32,
        /// Sequence number that actually arrived.
        received: u32,
    },

    /// A chunk declared a different file size than the transfer's
    /// fixed size. Fatal to the transfer.
    #[error("chunk file-size mismatch: expected {expected}, received {received}")]
    SizeMismatch {
        /// File size fixed by the first sized chunk.
        expected: u64,
        /// File size the offending chunk declared.
        received: u64,
    },
}

impl ProtocolError {
    /// Returns true if this error is fatal to an in-flight transfer
    /// (no recovery message is defined for it).
    pub fn is_transfer_fatal(&self) -> bool {
        matches!(
            self,
            ProtocolError::SequenceMismatch { .. } | ProtocolError::SizeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_fatal_classification() {
        let err = ProtocolError::SequenceMismatch {
            expected: 2,
            received: 4,
        };
        assert!(err.is_transfer_fatal());
        assert!(!ProtocolError::EmptyFrame.is_transfer_fatal());
    }

    #[test]
    fn error_display() {
        let err = ProtocolError::SizeMismatch {
            expected: 100,
            received: 90,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("90"));
    }
}
