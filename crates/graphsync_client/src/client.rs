//! The sync session driver.

use crate::assemble::FileAssembler;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use graphsync_net::{derive_session_key, CipherState, Connection};
use graphsync_protocol::{
    Ack, AuthRequest, Delete, FileChunk, FileContainer, FileEnd, ListPages, ListSyncables,
    Message, NodeContainer, PullChunk, PullExport, PullFile, PullNode, PullRelationship,
    PushExport, RelationshipContainer, SyncableInfo,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// What one bulk pull brought over.
#[derive(Debug, Default)]
pub struct PullReport {
    /// Plain nodes received, in pull order.
    pub nodes: Vec<NodeContainer>,
    /// Relationships received, in pull order.
    pub rels: Vec<RelationshipContainer>,
    /// Files written to disk, at their final destination paths.
    pub files: Vec<PathBuf>,
}

/// Drives one sync session over a connection.
///
/// Exchanges are strictly half-duplex: every method sends one request
/// and waits for its reply before returning, so exactly one message
/// is in flight at any time.
#[derive(Debug)]
pub struct SyncClient<S> {
    conn: Connection<S>,
    config: ClientConfig,
}

impl SyncClient<TcpStream> {
    /// Connects to a sync server over TCP.
    pub async fn connect(addr: impl tokio::net::ToSocketAddrs, config: ClientConfig) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr).await.map_err(graphsync_net::NetError::Io)?;
        Ok(Self::over(stream, config))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> SyncClient<S> {
    /// Adopts any duplex stream as the session transport.
    pub fn over(stream: S, config: ClientConfig) -> Self {
        let conn = Connection::new(stream).with_max_frame(config.max_frame);
        Self { conn, config }
    }

    /// Returns the underlying connection state.
    pub fn connection(&self) -> &Connection<S> {
        &self.conn
    }

    /// Runs the authentication handshake and installs the session
    /// cipher.
    ///
    /// The key is derived locally from the caller's password and the
    /// salt the server returned; only the at-rest password blob and
    /// the salt ever cross the wire.
    pub async fn authenticate(&mut self, user_name: &str, password: &str) -> ClientResult<()> {
        let request = AuthRequest::new(user_name, self.config.key_length);
        let reply = self.request(&Message::AuthRequest(request)).await?;
        let Message::AuthResponse(response) = reply else {
            return Err(unexpected("AuthResponse", &reply));
        };

        let key = derive_session_key(
            password.as_bytes(),
            response.salt.as_deref().map(str::as_bytes),
            response.key_length as usize,
        )?;
        self.conn.install_cipher(CipherState::install(&key)?);
        self.conn.set_principal(&response.user_name);

        info!(user = %response.user_name, key_length = response.key_length, "authenticated");
        Ok(())
    }

    /// Opens the transaction bracket on the server.
    pub async fn begin(&mut self) -> ClientResult<()> {
        let reply = self.request(&Message::Begin).await?;
        match reply {
            Message::Ack(ack) if ack.message == "Begin" => {
                self.conn.advance_progress();
                Ok(())
            }
            other => Err(unexpected("Ack", &other)),
        }
    }

    /// Signals the end of application messages; the server commits,
    /// answers `End`, and tears the connection down.
    pub async fn finish(&mut self) -> ClientResult<()> {
        let reply = self.request(&Message::Finish).await?;
        match reply {
            Message::End => {
                self.conn.shutdown().await.ok();
                Ok(())
            }
            other => Err(unexpected("End", &other)),
        }
    }

    /// Commits and closes without waiting for a reply. Terminal.
    pub async fn end(&mut self) -> ClientResult<()> {
        self.conn.send(&Message::End).await?;
        self.conn.shutdown().await.ok();
        Ok(())
    }

    /// Sends a keepalive and waits for its echo.
    pub async fn ping(&mut self) -> ClientResult<()> {
        let reply = self.request(&Message::Ping).await?;
        match reply {
            Message::Ping => {
                self.conn.advance_progress();
                Ok(())
            }
            other => Err(unexpected("Ping", &other)),
        }
    }

    /// Deletes a remote entity by id.
    pub async fn delete(&mut self, entity_id: &str) -> ClientResult<()> {
        let reply = self.request(&Message::Delete(Delete::new(entity_id))).await?;
        match reply {
            Message::Ack(_) => Ok(()),
            other => Err(unexpected("Ack", &other)),
        }
    }

    /// Fetches the names of the remote pages.
    pub async fn list_pages(&mut self) -> ClientResult<Vec<String>> {
        let reply = self
            .request(&Message::ListPages(ListPages::request()))
            .await?;
        match reply {
            Message::ListPages(list) => Ok(list.names),
            other => Err(unexpected("ListPages", &other)),
        }
    }

    /// Fetches the remote syncable catalog.
    pub async fn list_syncables(&mut self) -> ClientResult<Vec<SyncableInfo>> {
        let reply = self
            .request(&Message::ListSyncables(ListSyncables::request()))
            .await?;
        match reply {
            Message::ListSyncables(list) => Ok(list.syncables),
            other => Err(unexpected("ListSyncables", &other)),
        }
    }

    /// Pulls the export set of a root entity, one request per unit of
    /// work. File-typed nodes are transferred chunk by chunk and
    /// written under `dest_dir`.
    pub async fn pull(
        &mut self,
        root_id: &str,
        recursive: bool,
        dest_dir: &Path,
    ) -> ClientResult<PullReport> {
        let request = PullExport::request(root_id, recursive);
        let reply = self.request(&Message::PullExport(request)).await?;
        let Message::PullExport(export) = reply else {
            return Err(unexpected("PullExport", &reply));
        };
        let Some(key) = export.key.clone() else {
            return Err(unexpected("PullExport with key", &Message::PullExport(export)));
        };

        debug!(key = %key, num_nodes = export.num_nodes, num_rels = export.num_rels, "pulling export set");
        let mut report = PullReport::default();

        for index in 0..export.num_nodes {
            let reply = self
                .request(&Message::PullNode(PullNode::new(&key, index)))
                .await?;
            let Message::Node(node) = reply else {
                return Err(unexpected("Node", &reply));
            };

            if node.node_type == "File" {
                let path = self.pull_file(&key, index, dest_dir).await?;
                report.files.push(path);
            }
            report.nodes.push(node);
        }

        for index in 0..export.num_rels {
            let reply = self
                .request(&Message::PullRelationship(PullRelationship::new(&key, index)))
                .await?;
            let Message::Relationship(rel) = reply else {
                return Err(unexpected("Relationship", &reply));
            };
            report.rels.push(rel);
        }

        info!(
            nodes = report.nodes.len(),
            rels = report.rels.len(),
            files = report.files.len(),
            "pull complete"
        );
        Ok(report)
    }

    /// Runs one chunked file transfer and returns the destination
    /// path the content was relocated to.
    async fn pull_file(&mut self, key: &str, index: u32, dest_dir: &Path) -> ClientResult<PathBuf> {
        let reply = self
            .request(&Message::PullFile(PullFile::new(key, index)))
            .await?;
        let Message::FileBegin(container) = reply else {
            return Err(unexpected("FileBegin", &reply));
        };

        let container_id = container.source_node_id.clone();
        let file_size = container.file_size;
        let mut assembler = FileAssembler::begin(dest_dir, &container)?;

        // Pull chunks in increasing sequence order until the end
        // marker arrives; the server produces it exactly once.
        let mut sequence = 0u32;
        loop {
            let reply = self
                .request(&Message::PullChunk(PullChunk::new(
                    &container_id,
                    sequence,
                    file_size,
                )))
                .await?;
            match reply {
                Message::FileChunk(chunk) => {
                    assembler.add_chunk(&chunk)?;
                    sequence += 1;
                }
                Message::FileEnd(end) => {
                    return Ok(assembler.finish(&end)?);
                }
                other => return Err(unexpected("FileChunk or FileEnd", &other)),
            }
        }
    }

    /// Pushes nodes and relationships, waiting for the ack of each
    /// container before sending the next.
    pub async fn push(
        &mut self,
        nodes: Vec<NodeContainer>,
        rels: Vec<RelationshipContainer>,
    ) -> ClientResult<()> {
        let announce = PushExport::new(nodes.len() as u32, rels.len() as u32);
        let reply = self.request(&Message::PushExport(announce)).await?;
        let Message::Ack(_) = reply else {
            return Err(unexpected("Ack", &reply));
        };

        let mut sequence = 0u32;
        for node in nodes {
            let message = Message::Node(node.with_sequence(sequence));
            self.expect_ack(&message, sequence).await?;
            sequence += 1;
        }
        for rel in rels {
            let message = Message::Relationship(rel.with_sequence(sequence));
            self.expect_ack(&message, sequence).await?;
            sequence += 1;
        }
        Ok(())
    }

    /// Pushes one file node and its content, chunk by chunk.
    pub async fn push_file<R: Read>(
        &mut self,
        container: FileContainer,
        content: &mut R,
    ) -> ClientResult<()> {
        let container_id = container.source_node_id.clone();
        let file_size = container.file_size;

        let reply = self.request(&Message::FileBegin(container)).await?;
        let Message::Ack(_) = reply else {
            return Err(unexpected("Ack", &reply));
        };

        let mut sequence = 0u32;
        loop {
            let mut buf = vec![0u8; self.config.chunk_size];
            let mut filled = 0;
            while filled < buf.len() {
                let n = content.read(&mut buf[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                break;
            }
            buf.truncate(filled);

            let chunk = FileChunk::new(&container_id, sequence, file_size, buf);
            self.expect_ack(&Message::FileChunk(chunk), sequence).await?;
            sequence += 1;
        }

        let end = FileEnd::new(&container_id, file_size);
        let reply = self.request(&Message::FileEnd(end)).await?;
        match reply {
            Message::Ack(_) => Ok(()),
            other => Err(unexpected("Ack", &other)),
        }
    }

    async fn expect_ack(&mut self, message: &Message, sequence: u32) -> ClientResult<()> {
        let reply = self.request(message).await?;
        match reply {
            Message::Ack(Ack { sequence: acked, .. }) if acked == sequence => Ok(()),
            Message::Ack(ack) => Err(ClientError::Violation(
                graphsync_protocol::ProtocolError::SequenceMismatch {
                    expected: sequence,
                    received: ack.sequence,
                },
            )),
            other => Err(unexpected("Ack", &other)),
        }
    }

    /// Sends one message and waits for its reply, bounded by the
    /// request timeout. An `Error` reply lands in the connection
    /// state and surfaces as [`ClientError::Server`].
    async fn request(&mut self, message: &Message) -> ClientResult<Message> {
        self.conn.send(message).await?;

        let received = tokio::time::timeout(self.config.request_timeout, self.conn.recv())
            .await
            .map_err(|_| ClientError::Timeout)??;

        if let Message::Error(error) = received {
            self.conn.record_error(error.clone());
            return Err(ClientError::Server(error));
        }
        Ok(received)
    }
}

fn unexpected(expected: &'static str, received: &Message) -> ClientError {
    ClientError::Unexpected {
        expected,
        received: received.name(),
    }
}
