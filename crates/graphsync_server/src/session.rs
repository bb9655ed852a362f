//! Per-connection session state.

use crate::chunk::ChunkStream;
use crate::export::ExportSet;
use graphsync_protocol::ChunkGuard;
use graphsync_store::{FileSink, TxId};
use std::collections::{HashMap, HashSet};

/// An inbound (push-path) file transfer: the open sink plus the
/// sequence/size guard over its chunks.
pub(crate) struct InboundFile {
    pub(crate) sink: Box<dyn FileSink>,
    pub(crate) guard: ChunkGuard,
}

/// Transfer state scoped to one connection.
///
/// Export sets and chunk streams are keyed by the opaque ids minted
/// for them and are owned here until the handler that created them
/// removes them on exhaustion. Keys are generated per request and
/// never reused across connections.
#[derive(Default)]
pub(crate) struct SessionContext {
    /// The open transaction bracket, between `Begin` and `End`.
    pub(crate) tx: Option<TxId>,
    /// Resolved export sets by transfer key.
    pub(crate) exports: HashMap<String, ExportSet>,
    /// File transfers announced by `PullFile` but not yet started:
    /// container id to file node id. Armed exactly once.
    pub(crate) pending_files: HashMap<String, String>,
    /// Active outbound chunk streams by container id.
    pub(crate) chunk_streams: HashMap<String, ChunkStream>,
    /// Active inbound (push-path) file transfers by container id.
    pub(crate) inbound_files: HashMap<String, InboundFile>,
    /// `(type, start, end)` triples of relationships pushed inside the
    /// open transaction, for de-duplication before they are committed.
    pub(crate) pushed_rels: HashSet<(String, String, String)>,
}

impl SessionContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("tx", &self.tx)
            .field("exports", &self.exports.len())
            .field("pending_files", &self.pending_files.len())
            .field("chunk_streams", &self.chunk_streams.len())
            .field("inbound_files", &self.inbound_files.len())
            .finish()
    }
}
