//! Client configuration.

use graphsync_protocol::{CHUNK_SIZE, MAX_KEY_LEN};
use std::time::Duration;

/// Configuration for a sync client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound on every wait for a reply.
    pub request_timeout: Duration,
    /// Symmetric key length to request, in bytes. The server clamps
    /// it to what both ends support.
    pub key_length: u32,
    /// File chunk size for the push path, in bytes.
    pub chunk_size: usize,
    /// Maximum accepted incoming frame length in bytes.
    pub max_frame: usize,
}

impl ClientConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            key_length: MAX_KEY_LEN as u32,
            chunk_size: CHUNK_SIZE,
            max_frame: graphsync_net::DEFAULT_MAX_FRAME,
        }
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the requested key length.
    pub fn with_key_length(mut self, key_length: u32) -> Self {
        self.key_length = key_length;
        self
    }

    /// Sets the push-path chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the incoming frame cap.
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.key_length, 32);
        assert_eq!(config.chunk_size, CHUNK_SIZE);
    }

    #[test]
    fn config_builder() {
        let config = ClientConfig::new()
            .with_key_length(16)
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.key_length, 16);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
