//! Per-variant message dispatch.

use crate::chunk::ChunkStream;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::export::resolve_export;
use crate::server::SharedStores;
use crate::session::{InboundFile, SessionContext};
use graphsync_net::{clamp_key_length, derive_session_key, CipherState, Connection};
use graphsync_protocol::{
    Ack, AuthRequest, AuthResponse, ChunkGuard, Delete, ErrorReply, FileChunk, FileContainer,
    FileEnd, ListPages, ListSyncables, Message, NodeContainer, ProtocolError, PullChunk,
    PullExport, PullFile, PullNode, PullRelationship, RelationshipContainer, SyncableInfo,
    SyncableKind,
};
use graphsync_store::{NodeRecord, RelationshipRecord};
use std::collections::hash_map::Entry;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the connection loop should do after one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionFlow {
    /// Keep reading.
    Continue,
    /// The session ended cleanly; close the connection.
    Closed,
}

/// Handles every message of one connection, strictly in arrival
/// order.
pub(crate) struct SessionHandler {
    stores: SharedStores,
    config: ServerConfig,
    ctx: SessionContext,
}

impl SessionHandler {
    pub(crate) fn new(stores: SharedStores, config: ServerConfig) -> Self {
        Self {
            stores,
            config,
            ctx: SessionContext::new(),
        }
    }

    /// Dispatches one received message and writes its replies.
    pub(crate) async fn handle<S>(
        &mut self,
        message: Message,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Everything except the handshake itself and keepalives
        // requires an authenticated principal.
        if conn.principal().is_none()
            && !matches!(
                message,
                Message::AuthRequest(_) | Message::Ping | Message::Error(_)
            )
        {
            warn!(name = message.name(), "message before authentication");
            conn.send(&Message::Error(ErrorReply::unauthorized()))
                .await?;
            return Ok(SessionFlow::Continue);
        }

        match message {
            Message::AuthRequest(m) => self.handle_auth(m, conn).await,
            Message::Begin => self.handle_begin(conn).await,
            Message::End => self.handle_end(conn).await,
            Message::Finish => self.handle_finish(conn).await,
            Message::Ack(m) => {
                debug!(ack = %m.message, sequence = m.sequence, "ack");
                conn.advance_progress();
                Ok(SessionFlow::Continue)
            }
            Message::Error(m) => {
                warn!(code = m.code, message = %m.message, "peer reported error");
                conn.record_error(m);
                Ok(SessionFlow::Continue)
            }
            Message::Ping => {
                conn.send(&Message::Ping).await?;
                Ok(SessionFlow::Continue)
            }
            Message::PullExport(m) => self.handle_pull_export(m, conn).await,
            Message::PullNode(m) => self.handle_pull_node(m, conn).await,
            Message::PullRelationship(m) => self.handle_pull_relationship(m, conn).await,
            Message::PullFile(m) => self.handle_pull_file(m, conn).await,
            Message::PullChunk(m) => self.handle_pull_chunk(m, conn).await,
            Message::PushExport(m) => {
                debug!(num_nodes = m.num_nodes, num_rels = m.num_rels, "push announced");
                conn.send(&Message::Ack(Ack::new("PushExport", 0))).await?;
                Ok(SessionFlow::Continue)
            }
            Message::Node(m) => self.handle_push_node(m, conn).await,
            Message::Relationship(m) => self.handle_push_relationship(m, conn).await,
            Message::FileBegin(m) => self.handle_push_file_begin(m, conn).await,
            Message::FileChunk(m) => self.handle_push_file_chunk(m, conn).await,
            Message::FileEnd(m) => self.handle_push_file_end(m, conn).await,
            Message::Delete(m) => self.handle_delete(m, conn).await,
            Message::ListPages(_) => self.handle_list_pages(conn).await,
            Message::ListSyncables(_) => self.handle_list_syncables(conn).await,
            Message::AuthResponse(_) => {
                warn!("unexpected AuthResponse on server side");
                conn.send(&Message::Error(ErrorReply::internal("unexpected message")))
                    .await?;
                Ok(SessionFlow::Continue)
            }
        }
    }

    /// Tears down whatever the session left open. An open transaction
    /// is rolled back so a disconnect before `End` leaves no partial
    /// writes visible.
    pub(crate) fn on_disconnect(&mut self) {
        if let Some(tx) = self.ctx.tx.take() {
            if let Err(e) = self.stores.graph.rollback(tx) {
                warn!(error = %e, "rollback on disconnect failed");
            } else {
                debug!("rolled back open transaction on disconnect");
            }
        }
        self.ctx = SessionContext::new();
    }

    async fn handle_auth<S>(
        &mut self,
        request: AuthRequest,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(principal) = self.stores.principals.principal(&request.user_name) else {
            warn!(user = %request.user_name, "authentication failed: unknown principal");
            conn.send(&Message::Error(ErrorReply::unauthorized()))
                .await?;
            return Ok(SessionFlow::Continue);
        };

        let key_length = clamp_key_length(request.key_length);
        let response = AuthResponse {
            user_name: principal.user_name.clone(),
            password_hash: principal.password_hash.clone(),
            salt: principal.salt.clone(),
            key_length: key_length as u32,
        };
        conn.send(&Message::AuthResponse(response)).await?;

        // Install the cipher now, not at the next send: every
        // subsequent frame, starting with the next message read, is
        // processed under the negotiated key. A failure here aborts
        // the connection.
        let key = derive_session_key(
            principal.secret.as_bytes(),
            principal.salt.as_deref().map(str::as_bytes),
            key_length,
        )?;
        conn.install_cipher(CipherState::install(&key)?);
        conn.set_principal(&principal.user_name);

        info!(user = %principal.user_name, key_length, "authenticated");
        Ok(SessionFlow::Continue)
    }

    async fn handle_begin<S>(&mut self, conn: &mut Connection<S>) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.ctx.tx.is_none() {
            match self.stores.graph.begin() {
                Ok(tx) => {
                    debug!(tx, "transaction opened");
                    self.ctx.tx = Some(tx);
                }
                Err(e) => {
                    warn!(error = %e, "begin failed");
                    conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                        .await?;
                    return Ok(SessionFlow::Continue);
                }
            }
        }
        conn.send(&Message::Ack(Ack::new("Begin", 0))).await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_end<S>(&mut self, _conn: &mut Connection<S>) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.commit_open();
        info!("session ended");
        Ok(SessionFlow::Closed)
    }

    async fn handle_finish<S>(&mut self, conn: &mut Connection<S>) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.commit_open();
        conn.send(&Message::End).await?;
        info!("session finished");
        Ok(SessionFlow::Closed)
    }

    fn commit_open(&mut self) {
        if let Some(tx) = self.ctx.tx.take() {
            if let Err(e) = self.stores.graph.commit(tx) {
                warn!(error = %e, "commit failed");
            } else {
                debug!(tx, "transaction committed");
            }
        }
        self.ctx.pushed_rels.clear();
    }

    async fn handle_pull_export<S>(
        &mut self,
        request: PullExport,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let set = resolve_export(
            self.stores.graph.as_ref(),
            &request.root_id,
            request.recursive,
            self.config.max_export_nodes,
        );
        let Some(set) = set else {
            warn!(root = %request.root_id, "pull root unresolvable");
            conn.send(&Message::Error(ErrorReply::not_found(format!(
                "no such entity: {}",
                request.root_id
            ))))
            .await?;
            return Ok(SessionFlow::Continue);
        };

        let key = Uuid::new_v4().to_string();
        let reply = PullExport {
            root_id: request.root_id,
            recursive: request.recursive,
            key: Some(key.clone()),
            num_nodes: set.num_nodes(),
            num_rels: set.num_rels(),
        };
        debug!(key = %key, num_nodes = reply.num_nodes, num_rels = reply.num_rels, "export resolved");
        self.ctx.exports.insert(key, set);
        conn.send(&Message::PullExport(reply)).await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_pull_node<S>(
        &mut self,
        request: PullNode,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(node) = self
            .ctx
            .exports
            .get(&request.key)
            .and_then(|set| set.nodes.get(request.index as usize))
        else {
            conn.send(&Message::Error(ErrorReply::not_found(
                "stale transfer key or index out of range",
            )))
            .await?;
            return Ok(SessionFlow::Continue);
        };

        let container = NodeContainer {
            source_node_id: node.id.clone(),
            node_type: node.node_type.clone(),
            sequence: request.index,
            properties: node.properties.clone(),
        };
        conn.send(&Message::Node(container)).await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_pull_relationship<S>(
        &mut self,
        request: PullRelationship,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(rel) = self
            .ctx
            .exports
            .get(&request.key)
            .and_then(|set| set.rels.get(request.index as usize))
        else {
            conn.send(&Message::Error(ErrorReply::not_found(
                "stale transfer key or index out of range",
            )))
            .await?;
            return Ok(SessionFlow::Continue);
        };

        let container = RelationshipContainer {
            source_start_id: rel.start_id.clone(),
            source_end_id: rel.end_id.clone(),
            relationship_id: rel.id.clone(),
            rel_type: rel.rel_type.clone(),
            sequence: request.index,
            properties: rel.properties.clone(),
        };
        conn.send(&Message::Relationship(container)).await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_pull_file<S>(
        &mut self,
        request: PullFile,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(node) = self
            .ctx
            .exports
            .get(&request.key)
            .and_then(|set| set.nodes.get(request.node_index as usize))
            .cloned()
        else {
            conn.send(&Message::Error(ErrorReply::not_found(
                "stale transfer key or index out of range",
            )))
            .await?;
            return Ok(SessionFlow::Continue);
        };

        if !node.is_file() {
            conn.send(&Message::Error(ErrorReply::not_found(format!(
                "not a file node: {}",
                node.id
            ))))
            .await?;
            return Ok(SessionFlow::Continue);
        }

        let file_size = match self.stores.files.file_size(&node.id) {
            Ok(size) => size,
            Err(e) => {
                warn!(node = %node.id, error = %e, "file size lookup failed");
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
                return Ok(SessionFlow::Continue);
            }
        };

        // Arm the chunk stream; it is created lazily on the first
        // PullChunk and can only be armed once per PullFile.
        self.ctx
            .pending_files
            .insert(node.id.clone(), node.id.clone());

        let container = FileContainer {
            source_node_id: node.id.clone(),
            node_type: node.node_type.clone(),
            file_name: node.name().unwrap_or(&node.id).to_string(),
            file_size,
            sequence: request.node_index,
            properties: node.properties.clone(),
        };
        conn.send(&Message::FileBegin(container)).await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_pull_chunk<S>(
        &mut self,
        request: PullChunk,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let container_id = request.container_id;

        let stream = match self.ctx.chunk_streams.entry(container_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                // First pull for this container: the transfer must
                // have been armed by PullFile. An exhausted stream is
                // gone for good, so a late pull fails closed here.
                let Some(node_id) = self.ctx.pending_files.remove(&container_id) else {
                    conn.send(&Message::Error(ErrorReply::not_found(format!(
                        "no chunk stream for container {container_id}"
                    ))))
                    .await?;
                    return Ok(SessionFlow::Continue);
                };

                let opened = self
                    .stores
                    .files
                    .file_size(&node_id)
                    .and_then(|size| Ok((size, self.stores.files.open_read(&node_id)?)));
                match opened {
                    Ok((size, reader)) => {
                        entry.insert(ChunkStream::new(reader, self.config.chunk_size, size))
                    }
                    Err(e) => {
                        warn!(node = %node_id, error = %e, "opening file content failed");
                        conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                            .await?;
                        return Ok(SessionFlow::Continue);
                    }
                }
            }
        };

        match stream.next_chunk() {
            Ok(Some((sequence, data))) => {
                let file_size = stream.file_size();
                conn.send(&Message::FileChunk(FileChunk {
                    container_id,
                    sequence,
                    file_size,
                    data,
                }))
                .await?;
            }
            Ok(None) => {
                let file_size = stream.file_size();
                // Remove before answering so exactly one end marker
                // can ever be produced for this container.
                self.ctx.chunk_streams.remove(&container_id);
                conn.send(&Message::FileEnd(FileEnd {
                    container_id,
                    file_size,
                }))
                .await?;
            }
            Err(e) => {
                warn!(container = %container_id, error = %e, "chunk read failed");
                self.ctx.chunk_streams.remove(&container_id);
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
            }
        }
        Ok(SessionFlow::Continue)
    }

    async fn handle_push_node<S>(
        &mut self,
        container: NodeContainer,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(tx) = self.ctx.tx else {
            conn.send(&Message::Error(ErrorReply::internal("no open transaction")))
                .await?;
            return Ok(SessionFlow::Continue);
        };

        let record = NodeRecord {
            id: container.source_node_id.clone(),
            node_type: container.node_type.clone(),
            properties: container.properties.clone(),
        };
        match self.stores.graph.upsert_node(tx, record) {
            Ok(()) => {
                conn.send(&Message::Ack(Ack::new("Node", container.sequence)))
                    .await?;
            }
            Err(e) => {
                warn!(node = %container.source_node_id, error = %e, "node upsert failed");
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
            }
        }
        Ok(SessionFlow::Continue)
    }

    async fn handle_push_relationship<S>(
        &mut self,
        container: RelationshipContainer,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(tx) = self.ctx.tx else {
            conn.send(&Message::Error(ErrorReply::internal("no open transaction")))
                .await?;
            return Ok(SessionFlow::Continue);
        };

        // Duplicate means same type and endpoints, regardless of the
        // relationship's own id or properties. Check the committed
        // graph and everything pushed earlier in this bracket.
        let triple = (
            container.rel_type.clone(),
            container.source_start_id.clone(),
            container.source_end_id.clone(),
        );
        let duplicate = !self.ctx.pushed_rels.insert(triple)
            || self
                .stores
                .graph
                .outgoing(&container.source_start_id)
                .iter()
                .any(|r| r.rel_type == container.rel_type && r.end_id == container.source_end_id);

        if duplicate {
            debug!(rel = %container.relationship_id, "duplicate relationship skipped");
            conn.send(&Message::Ack(Ack::new("Relationship", container.sequence)))
                .await?;
            return Ok(SessionFlow::Continue);
        }

        let record = RelationshipRecord {
            id: container.relationship_id.clone(),
            start_id: container.source_start_id.clone(),
            end_id: container.source_end_id.clone(),
            rel_type: container.rel_type.clone(),
            properties: container.properties.clone(),
        };
        match self.stores.graph.upsert_relationship(tx, record) {
            Ok(()) => {
                conn.send(&Message::Ack(Ack::new("Relationship", container.sequence)))
                    .await?;
            }
            Err(e) => {
                warn!(rel = %container.relationship_id, error = %e, "relationship upsert failed");
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
            }
        }
        Ok(SessionFlow::Continue)
    }

    async fn handle_push_file_begin<S>(
        &mut self,
        container: FileContainer,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(tx) = self.ctx.tx else {
            conn.send(&Message::Error(ErrorReply::internal("no open transaction")))
                .await?;
            return Ok(SessionFlow::Continue);
        };

        let mut record = NodeRecord::new(&container.source_node_id, &container.node_type);
        record.properties = container.properties.clone();
        if record.name().is_none() {
            record = record.with_property(
                "name",
                graphsync_codec::Value::Text(container.file_name.clone()),
            );
        }
        if let Err(e) = self.stores.graph.upsert_node(tx, record) {
            warn!(node = %container.source_node_id, error = %e, "file node upsert failed");
            conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                .await?;
            return Ok(SessionFlow::Continue);
        }

        let sink = match self.stores.files.open_write(&container.source_node_id) {
            Ok(sink) => sink,
            Err(e) => {
                warn!(node = %container.source_node_id, error = %e, "opening file sink failed");
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
                return Ok(SessionFlow::Continue);
            }
        };

        self.ctx.inbound_files.insert(
            container.source_node_id.clone(),
            InboundFile {
                sink,
                guard: ChunkGuard::with_size(container.file_size),
            },
        );
        conn.send(&Message::Ack(Ack::new("FileBegin", container.sequence)))
            .await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_push_file_chunk<S>(
        &mut self,
        chunk: FileChunk,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(inbound) = self.ctx.inbound_files.get_mut(&chunk.container_id) else {
            conn.send(&Message::Error(ErrorReply::not_found(format!(
                "no inbound transfer for container {}",
                chunk.container_id
            ))))
            .await?;
            return Ok(SessionFlow::Continue);
        };

        if let Err(violation) = inbound.guard.accept(chunk.sequence, chunk.file_size) {
            return self.fatal_violation(violation, conn).await;
        }

        // A write failure is logged but does not abort the transfer
        // loop; the size invariant surfaces the corruption.
        if let Err(e) = inbound.sink.write_all(&chunk.data) {
            warn!(container = %chunk.container_id, error = %e, "chunk write failed");
        }

        conn.send(&Message::Ack(Ack::new("FileChunk", chunk.sequence)))
            .await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_push_file_end<S>(
        &mut self,
        end: FileEnd,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(inbound) = self.ctx.inbound_files.remove(&end.container_id) else {
            conn.send(&Message::Error(ErrorReply::not_found(format!(
                "no inbound transfer for container {}",
                end.container_id
            ))))
            .await?;
            return Ok(SessionFlow::Continue);
        };

        if let Err(violation) = inbound.guard.finish(end.file_size) {
            return self.fatal_violation(violation, conn).await;
        }

        let chunks = inbound.guard.chunks_accepted();
        match inbound.sink.finish() {
            Ok(()) => {
                debug!(container = %end.container_id, chunks, "inbound file stored");
                conn.send(&Message::Ack(Ack::new("FileEnd", chunks))).await?;
            }
            Err(e) => {
                warn!(container = %end.container_id, error = %e, "storing inbound file failed");
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
            }
        }
        Ok(SessionFlow::Continue)
    }

    async fn handle_delete<S>(
        &mut self,
        delete: Delete,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(tx) = self.ctx.tx else {
            conn.send(&Message::Error(ErrorReply::internal("no open transaction")))
                .await?;
            return Ok(SessionFlow::Continue);
        };

        match self.stores.graph.delete_entity(tx, &delete.entity_id) {
            Ok(()) => {
                debug!(entity = %delete.entity_id, "deletion recorded");
                conn.send(&Message::Ack(Ack::new("Delete", 0))).await?;
            }
            Err(e) => {
                warn!(entity = %delete.entity_id, error = %e, "delete failed");
                conn.send(&Message::Error(ErrorReply::internal(e.to_string())))
                    .await?;
            }
        }
        Ok(SessionFlow::Continue)
    }

    async fn handle_list_pages<S>(&mut self, conn: &mut Connection<S>) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let names = self
            .stores
            .graph
            .nodes_of_type("Page")
            .iter()
            .map(|n| n.name().unwrap_or(&n.id).to_string())
            .collect();
        conn.send(&Message::ListPages(ListPages { names })).await?;
        Ok(SessionFlow::Continue)
    }

    async fn handle_list_syncables<S>(
        &mut self,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut syncables: Vec<SyncableInfo> = self
            .stores
            .graph
            .all_nodes()
            .into_iter()
            .map(|n| SyncableInfo {
                id: n.id.clone(),
                name: n.name().map(str::to_string),
                kind: SyncableKind::Node,
                entity_type: n.node_type,
            })
            .collect();
        syncables.extend(self.stores.graph.all_relationships().into_iter().map(|r| {
            SyncableInfo {
                id: r.id,
                name: None,
                kind: SyncableKind::Relationship,
                entity_type: r.rel_type,
            }
        }));

        conn.send(&Message::ListSyncables(ListSyncables { syncables }))
            .await?;
        Ok(SessionFlow::Continue)
    }

    /// Reports a transfer invariant violation to the peer and tears
    /// the connection down: the protocol defines no recovery for it.
    async fn fatal_violation<S>(
        &mut self,
        violation: ProtocolError,
        conn: &mut Connection<S>,
    ) -> ServerResult<SessionFlow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        warn!(error = %violation, "transfer invariant violated");
        conn.send(&Message::Error(ErrorReply::internal(violation.to_string())))
            .await
            .ok();
        Err(violation.into())
    }
}
