//! Entity data containers.
//!
//! Containers are the serialized representations of graph entities,
//! used both to push (receiver stores them into its local graph) and
//! to pull (sender reads its local graph into a container). Each
//! carries a sequence number, starting at 0 and strictly increasing
//! per logical transfer.

use graphsync_codec::{CodecResult, Reader, Value, Writer};

/// An ordered property map (string key to typed value).
pub type PropertyMap = Vec<(String, Value)>;

/// Serialized representation of a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContainer {
    /// Id of the node on the sending instance.
    pub source_node_id: String,
    /// Type name of the node.
    pub node_type: String,
    /// Position of this container in its transfer.
    pub sequence: u32,
    /// Node properties in storage order.
    pub properties: PropertyMap,
}

impl NodeContainer {
    /// Creates a container for the given node.
    pub fn new(source_node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            node_type: node_type.into(),
            sequence: 0,
            properties: PropertyMap::new(),
        }
    }

    /// Sets the transfer sequence number.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.push((key.into(), value));
        self
    }

    pub(crate) fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.source_node_id);
        w.put_str(&self.node_type);
        w.put_i32(self.sequence as i32);
        w.put_map(&self.properties);
    }

    pub(crate) fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            source_node_id: r.get_str()?,
            node_type: r.get_str()?,
            sequence: r.get_i32()? as u32,
            properties: r.get_map()?,
        })
    }
}

/// Serialized representation of a graph relationship.
///
/// Value equality is defined over `(rel_type, source_start_id,
/// source_end_id)` only: two containers naming the same type and
/// endpoints are duplicates regardless of their relationship id or
/// properties. Bulk transfer relies on this for de-duplication.
#[derive(Debug, Clone)]
pub struct RelationshipContainer {
    /// Id of the start node on the sending instance.
    pub source_start_id: String,
    /// Id of the end node on the sending instance.
    pub source_end_id: String,
    /// Id of the relationship on the sending instance.
    pub relationship_id: String,
    /// Type name of the relationship.
    pub rel_type: String,
    /// Position of this container in its transfer.
    pub sequence: u32,
    /// Relationship properties in storage order.
    pub properties: PropertyMap,
}

impl RelationshipContainer {
    /// Creates a container for the given relationship.
    pub fn new(
        source_start_id: impl Into<String>,
        source_end_id: impl Into<String>,
        relationship_id: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            source_start_id: source_start_id.into(),
            source_end_id: source_end_id.into(),
            relationship_id: relationship_id.into(),
            rel_type: rel_type.into(),
            sequence: 0,
            properties: PropertyMap::new(),
        }
    }

    /// Sets the transfer sequence number.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.push((key.into(), value));
        self
    }

    pub(crate) fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.source_start_id);
        w.put_str(&self.source_end_id);
        w.put_str(&self.relationship_id);
        w.put_str(&self.rel_type);
        w.put_i32(self.sequence as i32);
        w.put_map(&self.properties);
    }

    pub(crate) fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            source_start_id: r.get_str()?,
            source_end_id: r.get_str()?,
            relationship_id: r.get_str()?,
            rel_type: r.get_str()?,
            sequence: r.get_i32()? as u32,
            properties: r.get_map()?,
        })
    }
}

impl PartialEq for RelationshipContainer {
    fn eq(&self, other: &Self) -> bool {
        self.rel_type == other.rel_type
            && self.source_start_id == other.source_start_id
            && self.source_end_id == other.source_end_id
    }
}

impl Eq for RelationshipContainer {}

/// Serialized representation of a file-backed node.
///
/// Opens a chunked file transfer; the content follows as
/// `FileChunk` messages terminated by a single `FileEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContainer {
    /// Id of the file node on the sending instance.
    pub source_node_id: String,
    /// Type name of the node.
    pub node_type: String,
    /// File name, used as the relative destination path.
    pub file_name: String,
    /// Declared size of the file content in bytes.
    pub file_size: u64,
    /// Position of this container in its transfer.
    pub sequence: u32,
    /// Node properties in storage order.
    pub properties: PropertyMap,
}

impl FileContainer {
    /// Creates a container for the given file node.
    pub fn new(
        source_node_id: impl Into<String>,
        file_name: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            node_type: "File".into(),
            file_name: file_name.into(),
            file_size,
            sequence: 0,
            properties: PropertyMap::new(),
        }
    }

    /// Sets the transfer sequence number.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub(crate) fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.source_node_id);
        w.put_str(&self.node_type);
        w.put_str(&self.file_name);
        w.put_long(self.file_size as i64);
        w.put_i32(self.sequence as i32);
        w.put_map(&self.properties);
    }

    pub(crate) fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            source_node_id: r.get_str()?,
            node_type: r.get_str()?,
            file_name: r.get_str()?,
            file_size: r.get_long()? as u64,
            sequence: r.get_i32()? as u32,
            properties: r.get_map()?,
        })
    }
}

/// Whether a syncable entity is node-backed or relationship-backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncableKind {
    /// A graph node.
    Node,
    /// A graph relationship.
    Relationship,
}

impl SyncableKind {
    /// Converts to a numeric code for wire encoding.
    pub fn to_code(self) -> i32 {
        match self {
            SyncableKind::Node => 1,
            SyncableKind::Relationship => 2,
        }
    }

    /// Converts from a numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(SyncableKind::Node),
            2 => Some(SyncableKind::Relationship),
            _ => None,
        }
    }
}

/// Catalog entry describing one entity eligible for cloud transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncableInfo {
    /// Entity id.
    pub id: String,
    /// Display name, if the entity has one.
    pub name: Option<String>,
    /// Node-backed or relationship-backed.
    pub kind: SyncableKind,
    /// Type name of the entity.
    pub entity_type: String,
}

impl SyncableInfo {
    pub(crate) fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.id);
        w.put_opt_str(self.name.as_deref());
        w.put_i32(self.kind.to_code());
        w.put_str(&self.entity_type);
    }

    pub(crate) fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        let id = r.get_str()?;
        let name = r.get_opt_str()?;
        let code = r.get_i32()?;
        let entity_type = r.get_str()?;
        let kind = SyncableKind::from_code(code)
            .ok_or(graphsync_codec::CodecError::InvalidTag(code as u8))?;
        Ok(Self {
            id,
            name,
            kind,
            entity_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_equality_ignores_id_and_properties() {
        let a = RelationshipContainer::new("n1", "n2", "r1", "LINKS_TO")
            .with_property("weight", Value::Int(1));
        let b = RelationshipContainer::new("n1", "n2", "r2", "LINKS_TO")
            .with_property("weight", Value::Int(9));

        assert_eq!(a, b);
    }

    #[test]
    fn relationship_equality_respects_type_and_endpoints() {
        let a = RelationshipContainer::new("n1", "n2", "r1", "LINKS_TO");

        assert_ne!(a, RelationshipContainer::new("n1", "n2", "r1", "OWNS"));
        assert_ne!(a, RelationshipContainer::new("n2", "n1", "r1", "LINKS_TO"));
        assert_ne!(a, RelationshipContainer::new("n1", "n3", "r1", "LINKS_TO"));
    }

    #[test]
    fn node_container_roundtrip() {
        let node = NodeContainer::new("abc", "Page")
            .with_sequence(3)
            .with_property("name", Value::Text("home".into()))
            .with_property("position", Value::Int(0));

        let mut w = Writer::new();
        node.encode_fields(&mut w);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let decoded = NodeContainer::decode_fields(&mut r).unwrap();
        assert_eq!(decoded, node);
        assert!(r.is_empty());
    }

    #[test]
    fn syncable_kind_codes() {
        assert_eq!(SyncableKind::from_code(1), Some(SyncableKind::Node));
        assert_eq!(SyncableKind::from_code(2), Some(SyncableKind::Relationship));
        assert_eq!(SyncableKind::from_code(3), None);
    }
}
