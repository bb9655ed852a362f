//! In-memory reference store.

use crate::error::{StoreError, StoreResult};
use crate::traits::{FileSink, FileStore, GraphStore, PrincipalStore, TxId};
use crate::types::{NodeRecord, Principal, RelationshipRecord};
use graphsync_codec::Value;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct GraphData {
    nodes: BTreeMap<String, NodeRecord>,
    rels: BTreeMap<String, RelationshipRecord>,
}

#[derive(Debug)]
enum TxOp {
    UpsertNode(NodeRecord),
    UpsertRelationship(RelationshipRecord),
    Delete(String),
}

/// In-memory implementation of the whole storage boundary.
///
/// Committed state lives behind one lock; each open transaction
/// buffers its writes and applies them atomically on commit, so a
/// connection that drops before `End` leaves nothing behind. Iteration
/// order is the id order of the underlying maps, which keeps export
/// resolution deterministic for a fixed snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: RwLock<GraphData>,
    pending: Mutex<HashMap<TxId, Vec<TxOp>>>,
    next_tx: AtomicU64,
    principals: RwLock<HashMap<String, Principal>>,
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node directly into committed state.
    pub fn insert_node(&self, node: NodeRecord) {
        self.graph.write().nodes.insert(node.id.clone(), node);
    }

    /// Inserts a relationship directly into committed state.
    pub fn insert_relationship(&self, rel: RelationshipRecord) {
        self.graph.write().rels.insert(rel.id.clone(), rel);
    }

    /// Creates a node with a fresh id and a name property.
    pub fn create_node(&self, node_type: &str, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert_node(
            NodeRecord::new(id.clone(), node_type).with_property("name", Value::Text(name.into())),
        );
        id
    }

    /// Creates a relationship with a fresh id.
    pub fn create_relationship(&self, start_id: &str, end_id: &str, rel_type: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert_relationship(RelationshipRecord::new(id.clone(), start_id, end_id, rel_type));
        id
    }

    /// Creates a file node with a fresh id and stores its content.
    pub fn create_file(&self, name: &str, content: &[u8]) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert_node(
            NodeRecord::new(id.clone(), "File")
                .with_property("name", Value::Text(name.into()))
                .with_property("size", Value::Long(content.len() as i64)),
        );
        self.files.write().insert(id.clone(), content.to_vec());
        id
    }

    /// Sets a file node's content directly.
    pub fn set_file_content(&self, node_id: &str, content: Vec<u8>) {
        self.files.write().insert(node_id.to_string(), content);
    }

    /// Registers a principal.
    pub fn add_principal(&self, principal: Principal) {
        self.principals
            .write()
            .insert(principal.user_name.clone(), principal);
    }

    /// Returns the number of committed nodes.
    pub fn node_count(&self) -> usize {
        self.graph.read().nodes.len()
    }

    /// Returns the number of committed relationships.
    pub fn relationship_count(&self) -> usize {
        self.graph.read().rels.len()
    }

    /// Returns a file node's content, if it has any.
    pub fn file_content(&self, node_id: &str) -> Option<Vec<u8>> {
        self.files.read().get(node_id).cloned()
    }

    fn apply(&self, ops: Vec<TxOp>) {
        let mut graph = self.graph.write();
        for op in ops {
            match op {
                TxOp::UpsertNode(node) => {
                    graph.nodes.insert(node.id.clone(), node);
                }
                TxOp::UpsertRelationship(rel) => {
                    graph.rels.insert(rel.id.clone(), rel);
                }
                TxOp::Delete(id) => {
                    if graph.nodes.remove(&id).is_some() {
                        // A deleted node takes its incident relationships with it.
                        graph.rels.retain(|_, r| r.start_id != id && r.end_id != id);
                        self.files.write().remove(&id);
                    } else {
                        graph.rels.remove(&id);
                    }
                }
            }
        }
    }

    fn buffer(&self, tx: TxId, op: TxOp) -> StoreResult<()> {
        let mut pending = self.pending.lock();
        pending
            .get_mut(&tx)
            .ok_or(StoreError::NoSuchTransaction(tx))?
            .push(op);
        Ok(())
    }
}

impl GraphStore for MemoryStore {
    fn node(&self, id: &str) -> Option<NodeRecord> {
        self.graph.read().nodes.get(id).cloned()
    }

    fn relationship(&self, id: &str) -> Option<RelationshipRecord> {
        self.graph.read().rels.get(id).cloned()
    }

    fn outgoing(&self, node_id: &str) -> Vec<RelationshipRecord> {
        self.graph
            .read()
            .rels
            .values()
            .filter(|r| r.start_id == node_id)
            .cloned()
            .collect()
    }

    fn incoming(&self, node_id: &str) -> Vec<RelationshipRecord> {
        self.graph
            .read()
            .rels
            .values()
            .filter(|r| r.end_id == node_id)
            .cloned()
            .collect()
    }

    fn nodes_of_type(&self, node_type: &str) -> Vec<NodeRecord> {
        self.graph
            .read()
            .nodes
            .values()
            .filter(|n| n.node_type == node_type)
            .cloned()
            .collect()
    }

    fn all_nodes(&self) -> Vec<NodeRecord> {
        self.graph.read().nodes.values().cloned().collect()
    }

    fn all_relationships(&self) -> Vec<RelationshipRecord> {
        self.graph.read().rels.values().cloned().collect()
    }

    fn begin(&self) -> StoreResult<TxId> {
        let tx = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.lock().insert(tx, Vec::new());
        Ok(tx)
    }

    fn commit(&self, tx: TxId) -> StoreResult<()> {
        let ops = self
            .pending
            .lock()
            .remove(&tx)
            .ok_or(StoreError::NoSuchTransaction(tx))?;
        self.apply(ops);
        Ok(())
    }

    fn rollback(&self, tx: TxId) -> StoreResult<()> {
        self.pending
            .lock()
            .remove(&tx)
            .ok_or(StoreError::NoSuchTransaction(tx))?;
        Ok(())
    }

    fn upsert_node(&self, tx: TxId, node: NodeRecord) -> StoreResult<()> {
        self.buffer(tx, TxOp::UpsertNode(node))
    }

    fn upsert_relationship(&self, tx: TxId, rel: RelationshipRecord) -> StoreResult<()> {
        self.buffer(tx, TxOp::UpsertRelationship(rel))
    }

    fn delete_entity(&self, tx: TxId, id: &str) -> StoreResult<()> {
        self.buffer(tx, TxOp::Delete(id.to_string()))
    }
}

impl PrincipalStore for MemoryStore {
    fn principal(&self, user_name: &str) -> Option<Principal> {
        self.principals.read().get(user_name).cloned()
    }
}

struct MemorySink {
    node_id: String,
    buf: Vec<u8>,
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl FileSink for MemorySink {
    fn finish(self: Box<Self>) -> StoreResult<()> {
        self.files.write().insert(self.node_id, self.buf);
        Ok(())
    }
}

impl FileStore for MemoryStore {
    fn file_size(&self, node_id: &str) -> StoreResult<u64> {
        self.files
            .read()
            .get(node_id)
            .map(|content| content.len() as u64)
            .ok_or_else(|| StoreError::NotAFile(node_id.to_string()))
    }

    fn open_read(&self, node_id: &str) -> StoreResult<Box<dyn Read + Send>> {
        let content = self
            .files
            .read()
            .get(node_id)
            .cloned()
            .ok_or_else(|| StoreError::NotAFile(node_id.to_string()))?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn open_write(&self, node_id: &str) -> StoreResult<Box<dyn FileSink>> {
        Ok(Box::new(MemorySink {
            node_id: node_id.to_string(),
            buf: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let tx = store.begin().unwrap();
        store
            .upsert_node(tx, NodeRecord::new("n1", "Page"))
            .unwrap();

        assert!(store.node("n1").is_none());
        store.commit(tx).unwrap();
        assert!(store.node("n1").is_some());
    }

    #[test]
    fn rollback_discards_writes() {
        let store = MemoryStore::new();
        let tx = store.begin().unwrap();
        store
            .upsert_node(tx, NodeRecord::new("n1", "Page"))
            .unwrap();
        store.rollback(tx).unwrap();

        assert!(store.node("n1").is_none());
        assert!(matches!(
            store.commit(tx),
            Err(StoreError::NoSuchTransaction(_))
        ));
    }

    #[test]
    fn mutating_a_closed_transaction_fails() {
        let store = MemoryStore::new();
        let tx = store.begin().unwrap();
        store.commit(tx).unwrap();

        let result = store.upsert_node(tx, NodeRecord::new("n1", "Page"));
        assert!(matches!(result, Err(StoreError::NoSuchTransaction(_))));
    }

    #[test]
    fn deleting_a_node_removes_incident_relationships() {
        let store = MemoryStore::new();
        let a = store.create_node("Page", "a");
        let b = store.create_node("Page", "b");
        store.create_relationship(&a, &b, "LINKS_TO");

        let tx = store.begin().unwrap();
        store.delete_entity(tx, &a).unwrap();
        store.commit(tx).unwrap();

        assert!(store.node(&a).is_none());
        assert_eq!(store.relationship_count(), 0);
        assert!(store.node(&b).is_some());
    }

    #[test]
    fn edge_enumeration() {
        let store = MemoryStore::new();
        let a = store.create_node("Page", "a");
        let b = store.create_node("Page", "b");
        let c = store.create_node("Page", "c");
        store.create_relationship(&a, &b, "LINKS_TO");
        store.create_relationship(&a, &c, "LINKS_TO");
        store.create_relationship(&b, &a, "LINKS_TO");

        assert_eq!(store.outgoing(&a).len(), 2);
        assert_eq!(store.incoming(&a).len(), 1);
        assert_eq!(store.outgoing(&c).len(), 0);
    }

    #[test]
    fn enumeration_order_is_stable() {
        let store = MemoryStore::new();
        let a = store.create_node("Page", "a");
        store.create_node("Page", "b");
        store.create_relationship(&a, &a, "SELF");

        let first: Vec<String> = store.all_nodes().into_iter().map(|n| n.id).collect();
        let second: Vec<String> = store.all_nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn principal_lookup() {
        let store = MemoryStore::new();
        store.add_principal(Principal::new("alice", "secret", Some("abc123".into())));

        let principal = store.principal("alice").unwrap();
        assert_eq!(principal.salt.as_deref(), Some("abc123"));
        assert!(store.principal("mallory").is_none());
    }

    #[test]
    fn file_content_roundtrip_through_sink() {
        let store = MemoryStore::new();
        let id = store.create_file("logo.png", b"old");
        assert_eq!(store.file_size(&id).unwrap(), 3);

        let mut sink = store.open_write(&id).unwrap();
        sink.write_all(b"new content").unwrap();
        sink.finish().unwrap();

        assert_eq!(store.file_content(&id).unwrap(), b"new content");
        let mut read = store.open_read(&id).unwrap();
        let mut buf = Vec::new();
        read.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"new content");
    }

    #[test]
    fn file_size_of_plain_node_fails() {
        let store = MemoryStore::new();
        let id = store.create_node("Page", "home");
        assert!(matches!(store.file_size(&id), Err(StoreError::NotAFile(_))));
    }
}
