//! Error types for the client.

use graphsync_net::NetError;
use graphsync_protocol::{ErrorReply, ProtocolError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while driving a sync session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection-level failure.
    #[error("connection error: {0}")]
    Net(#[from] NetError),

    /// Protocol violation, fatal to the in-flight transfer.
    #[error("protocol violation: {0}")]
    Violation(#[from] ProtocolError),

    /// The server answered with an error message.
    #[error("server error {}: {}", .0.code, .0.message)]
    Server(ErrorReply),

    /// The server answered with a message of the wrong kind.
    #[error("unexpected reply: expected {expected}, received {received}")]
    Unexpected {
        /// Kind of reply the exchange calls for.
        expected: &'static str,
        /// Kind that actually arrived.
        received: &'static str,
    },

    /// No reply arrived within the request timeout. Some failure
    /// modes surface only as a missing reply, so every wait is
    /// bounded.
    #[error("no reply within the request timeout")]
    Timeout,

    /// Local file I/O failure during reassembly.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Returns true if the session is beyond use and the connection
    /// should be dropped.
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Net(e) => e.is_fatal(),
            ClientError::Violation(_) | ClientError::Timeout => true,
            ClientError::Server(_) | ClientError::Unexpected { .. } | ClientError::Io(_) => false,
        }
    }
}
