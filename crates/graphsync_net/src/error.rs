//! Error types for the net crate.

use graphsync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for connection operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors that can occur on a connection.
#[derive(Error, Debug)]
pub enum NetError {
    /// Transport I/O failure. The connection is unusable and must be
    /// closed; there is no automatic reconnect or resume.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// An incoming frame declared a length above the configured cap.
    #[error("frame of {len} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Declared frame length.
        len: usize,
        /// Maximum the connection accepts.
        max: usize,
    },

    /// A message failed to encode or decode.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Cipher initialization, sealing, or opening failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The negotiated key length is not one this build supports.
    #[error("unsupported key length: {0} bytes")]
    UnsupportedKeyLength(usize),
}

impl NetError {
    /// Creates a crypto error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto(message.into())
    }

    /// Returns true if the connection is beyond use and must be torn
    /// down (as opposed to a single bad message).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NetError::Io(_) | NetError::Closed | NetError::FrameTooLarge { .. } | NetError::Crypto(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(NetError::Closed.is_fatal());
        assert!(NetError::crypto("bad tag").is_fatal());
        assert!(!NetError::Protocol(ProtocolError::EmptyFrame).is_fatal());
    }
}
