//! Accept loop and per-connection driver.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{SessionFlow, SessionHandler};
use graphsync_net::{Connection, NetError};
use graphsync_store::{FileStore, GraphStore, PrincipalStore};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// The storage collaborators shared by every connection.
///
/// These are the only mutable structures shared across connections;
/// each implementation is responsible for its own concurrency
/// control.
#[derive(Clone)]
pub struct SharedStores {
    /// The graph store.
    pub graph: Arc<dyn GraphStore>,
    /// The principal store.
    pub principals: Arc<dyn PrincipalStore>,
    /// The file store.
    pub files: Arc<dyn FileStore>,
}

impl SharedStores {
    /// Bundles three separate stores.
    pub fn new(
        graph: Arc<dyn GraphStore>,
        principals: Arc<dyn PrincipalStore>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            graph,
            principals,
            files,
        }
    }

    /// Bundles one store that implements the whole boundary.
    pub fn single<T>(store: Arc<T>) -> Self
    where
        T: GraphStore + PrincipalStore + FileStore + 'static,
    {
        Self {
            graph: store.clone(),
            principals: store.clone(),
            files: store,
        }
    }
}

impl std::fmt::Debug for SharedStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStores").finish_non_exhaustive()
    }
}

/// The sync server: a TCP listener spawning one task per accepted
/// connection.
#[derive(Debug)]
pub struct SyncServer {
    config: ServerConfig,
    stores: SharedStores,
}

impl SyncServer {
    /// Creates a server over the given stores.
    pub fn new(config: ServerConfig, stores: SharedStores) -> Self {
        Self { config, stores }
    }

    /// Binds and serves until the task is cancelled.
    pub async fn run(&self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "listening");

        loop {
            let (socket, peer) = listener.accept().await?;
            info!(%peer, "connection accepted");

            let stores = self.stores.clone();
            let config = self.config.clone();
            tokio::spawn(async move {
                match serve_stream(socket, stores, config).await {
                    Ok(()) => info!(%peer, "connection closed"),
                    Err(e) => warn!(%peer, error = %e, "connection failed"),
                }
            });
        }
    }
}

/// Drives one connection to completion over any duplex stream.
///
/// Strictly half-duplex: one message is read, processed to completion
/// (including any transaction work), and its replies written before
/// the next read. Whatever the session leaves open on disconnect is
/// rolled back.
pub async fn serve_stream<S>(
    stream: S,
    stores: SharedStores,
    config: ServerConfig,
) -> ServerResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = Connection::new(stream).with_max_frame(config.max_frame);
    let mut handler = SessionHandler::new(stores, config);

    let result = loop {
        let message = match conn.recv().await {
            Ok(message) => message,
            Err(NetError::Closed) => break Ok(()),
            Err(e) => break Err(e.into()),
        };

        match handler.handle(message, &mut conn).await {
            Ok(SessionFlow::Continue) => {}
            Ok(SessionFlow::Closed) => {
                conn.shutdown().await.ok();
                break Ok(());
            }
            Err(e) => break Err(e),
        }
    };

    handler.on_disconnect();
    result
}
