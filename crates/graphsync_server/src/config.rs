//! Server configuration.

use graphsync_protocol::CHUNK_SIZE;
use std::net::SocketAddr;

/// Configuration for the sync server.
///
/// The chunk size is deployment configuration both peers must agree
/// on, not something negotiated per message.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum accepted incoming frame length in bytes.
    pub max_frame: usize,
    /// File chunk size in bytes.
    pub chunk_size: usize,
    /// Maximum number of nodes one export set may resolve to.
    pub max_export_nodes: usize,
}

impl ServerConfig {
    /// Creates a configuration for the given bind address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_frame: graphsync_net::DEFAULT_MAX_FRAME,
            chunk_size: CHUNK_SIZE,
            max_export_nodes: 100_000,
        }
    }

    /// Sets the incoming frame cap.
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame;
        self
    }

    /// Sets the file chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the export-set size cap.
    pub fn with_max_export_nodes(mut self, max: usize) -> Self {
        self.max_export_nodes = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 7473)))
    }
}
