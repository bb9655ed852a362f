//! Error types for the server.

use graphsync_net::NetError;
use graphsync_protocol::ProtocolError;
use graphsync_store::StoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Connection-level failure. The connection is torn down.
    #[error("connection error: {0}")]
    Net(#[from] NetError),

    /// Protocol violation, fatal to the connection: there is no
    /// recovery message defined for it.
    #[error("protocol violation: {0}")]
    Violation(#[from] ProtocolError),

    /// Storage failure that escaped the lenient handler boundary.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Listener-level I/O failure (bind, accept).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if the failure came from the peer rather than
    /// this instance.
    pub fn is_peer_fault(&self) -> bool {
        matches!(self, ServerError::Net(_) | ServerError::Violation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_classification() {
        let err = ServerError::Violation(ProtocolError::EmptyFrame);
        assert!(err.is_peer_fault());

        let err = ServerError::Store(StoreError::other("disk on fire"));
        assert!(!err.is_peer_fault());
    }
}
