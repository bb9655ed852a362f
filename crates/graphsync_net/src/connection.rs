//! The stateful duplex channel.

use crate::cipher::CipherState;
use crate::error::NetResult;
use crate::frame::{read_frame, write_frame};
use graphsync_protocol::{ErrorReply, Message};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Default cap on incoming frame length.
pub const DEFAULT_MAX_FRAME: usize = 16 * 1024 * 1024;

/// One end of a protocol connection.
///
/// Wraps any duplex byte stream and carries the connection-scoped
/// state: the cipher installed by the handshake, the authenticated
/// principal, the last protocol error received, and a progress
/// counter advanced by keepalives and error handling.
///
/// Message exchange is strictly half-duplex; callers alternate
/// `send` and `recv` and never pipeline.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    cipher: Option<CipherState>,
    principal: Option<String>,
    last_error: Option<ErrorReply>,
    progress: u64,
    max_frame: usize,
}

impl<S> Connection<S> {
    /// Wraps a stream in an unauthenticated, plaintext connection.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            cipher: None,
            principal: None,
            last_error: None,
            progress: 0,
            max_frame: DEFAULT_MAX_FRAME,
        }
    }

    /// Sets the incoming frame cap.
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame;
        self
    }

    /// Installs the negotiated cipher. Every frame from the next
    /// `send`/`recv` on is sealed.
    pub fn install_cipher(&mut self, cipher: CipherState) {
        self.cipher = Some(cipher);
    }

    /// Returns the installed cipher, if the handshake has completed.
    pub fn cipher(&self) -> Option<&CipherState> {
        self.cipher.as_ref()
    }

    /// Returns true once a cipher is installed.
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Records the authenticated principal for this session.
    pub fn set_principal(&mut self, name: impl Into<String>) {
        self.principal = Some(name.into());
    }

    /// Returns the authenticated principal, if any.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Installs a received protocol error and advances progress.
    pub fn record_error(&mut self, error: ErrorReply) {
        self.last_error = Some(error);
        self.advance_progress();
    }

    /// Returns the last protocol error received on this connection.
    pub fn last_error(&self) -> Option<&ErrorReply> {
        self.last_error.as_ref()
    }

    /// Advances the liveness progress counter.
    pub fn advance_progress(&mut self) {
        self.progress += 1;
    }

    /// Returns the liveness progress counter.
    pub fn progress(&self) -> u64 {
        self.progress
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Sends one message, sealing it when a cipher is installed.
    pub async fn send(&mut self, message: &Message) -> NetResult<()> {
        let encoded = message.encode();
        trace!(name = message.name(), len = encoded.len(), "send");
        let payload = match &self.cipher {
            Some(cipher) => cipher.seal(&encoded)?,
            None => encoded,
        };
        write_frame(&mut self.stream, &payload).await
    }

    /// Receives one message, opening it when a cipher is installed.
    pub async fn recv(&mut self) -> NetResult<Message> {
        let payload = read_frame(&mut self.stream, self.max_frame).await?;
        let bytes = match &self.cipher {
            Some(cipher) => cipher.open(&payload)?,
            None => payload,
        };
        let message = Message::decode(&bytes)?;
        trace!(name = message.name(), "recv");
        Ok(message)
    }

    /// Shuts the write side down. Closing the socket is the only
    /// cancellation primitive the protocol defines.
    pub async fn shutdown(&mut self) -> NetResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
