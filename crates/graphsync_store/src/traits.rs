//! Collaborator traits consumed by the protocol.

use crate::error::StoreResult;
use crate::types::{NodeRecord, Principal, RelationshipRecord};
use std::io::{Read, Write};

/// Handle of one open transaction.
pub type TxId = u64;

/// The graph store the protocol reads from and writes into.
///
/// Mutations take the open transaction handle; nothing becomes
/// visible to readers until `commit`. A transaction that is rolled
/// back (or simply never committed, e.g. the connection dropped)
/// leaves no writes behind.
pub trait GraphStore: Send + Sync {
    /// Resolves a node by id.
    fn node(&self, id: &str) -> Option<NodeRecord>;

    /// Resolves a relationship by id.
    fn relationship(&self, id: &str) -> Option<RelationshipRecord>;

    /// Enumerates relationships starting at the given node, in
    /// deterministic order.
    fn outgoing(&self, node_id: &str) -> Vec<RelationshipRecord>;

    /// Enumerates relationships ending at the given node, in
    /// deterministic order.
    fn incoming(&self, node_id: &str) -> Vec<RelationshipRecord>;

    /// Lists nodes of one type, in deterministic order.
    fn nodes_of_type(&self, node_type: &str) -> Vec<NodeRecord>;

    /// Lists every node, in deterministic order.
    fn all_nodes(&self) -> Vec<NodeRecord>;

    /// Lists every relationship, in deterministic order.
    fn all_relationships(&self) -> Vec<RelationshipRecord>;

    /// Opens a transaction scope.
    fn begin(&self) -> StoreResult<TxId>;

    /// Commits a transaction, making its writes visible atomically.
    fn commit(&self, tx: TxId) -> StoreResult<()>;

    /// Discards a transaction and its writes.
    fn rollback(&self, tx: TxId) -> StoreResult<()>;

    /// Creates or replaces a node inside the transaction.
    fn upsert_node(&self, tx: TxId, node: NodeRecord) -> StoreResult<()>;

    /// Creates or replaces a relationship inside the transaction.
    fn upsert_relationship(&self, tx: TxId, rel: RelationshipRecord) -> StoreResult<()>;

    /// Deletes a node or relationship by id inside the transaction.
    /// The id is resolved at commit time; an id that no longer
    /// resolves commits as a no-op.
    fn delete_entity(&self, tx: TxId, id: &str) -> StoreResult<()>;
}

/// The principal store consulted by the authentication handshake.
pub trait PrincipalStore: Send + Sync {
    /// Resolves a principal by login name.
    fn principal(&self, user_name: &str) -> Option<Principal>;
}

/// An open file-content write, finalized explicitly.
pub trait FileSink: Write + Send {
    /// Flushes and publishes the written content.
    fn finish(self: Box<Self>) -> StoreResult<()>;
}

/// The file store backing file-typed nodes.
pub trait FileStore: Send + Sync {
    /// Returns the declared content size of a file node.
    fn file_size(&self, node_id: &str) -> StoreResult<u64>;

    /// Opens the content of a file node for reading.
    fn open_read(&self, node_id: &str) -> StoreResult<Box<dyn Read + Send>>;

    /// Opens the content of a file node for writing.
    fn open_write(&self, node_id: &str) -> StoreResult<Box<dyn FileSink>>;
}
