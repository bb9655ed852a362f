//! Protocol messages.
//!
//! Each message is serialized as a one-byte type code followed by its
//! declared fields in a fixed order. The type code is assigned here,
//! at the catalog level; message payloads do not re-state it.

use crate::container::{FileContainer, NodeContainer, RelationshipContainer, SyncableInfo};
use crate::error::{ProtocolError, ProtocolResult};
use graphsync_codec::{CodecResult, Reader, Writer};

/// A protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Opens the authentication handshake.
    AuthRequest(AuthRequest),
    /// Answers the handshake with the key-derivation material.
    AuthResponse(AuthResponse),
    /// Opens the transaction scope on the server.
    Begin,
    /// Commits the transaction scope and ends the session. Terminal.
    End,
    /// Signals "no more application messages, proceed to teardown".
    Finish,
    /// Generic acknowledgment.
    Ack(Ack),
    /// Carries a fatal condition to the peer.
    Error(ErrorReply),
    /// Content-free keepalive.
    Ping,
    /// Requests (and, populated, answers) an export-set resolution.
    PullExport(PullExport),
    /// Requests one node of a resolved export set.
    PullNode(PullNode),
    /// Requests one relationship of a resolved export set.
    PullRelationship(PullRelationship),
    /// Requests the file transfer for one node of an export set.
    PullFile(PullFile),
    /// Requests the next chunk of an open file transfer.
    PullChunk(PullChunk),
    /// Announces a push-path bulk transfer.
    PushExport(PushExport),
    /// One serialized node.
    Node(NodeContainer),
    /// One serialized relationship.
    Relationship(RelationshipContainer),
    /// Opens a chunked file transfer.
    FileBegin(FileContainer),
    /// One chunk of file content.
    FileChunk(FileChunk),
    /// Terminates a chunked file transfer.
    FileEnd(FileEnd),
    /// Deletes a remote entity by id.
    Delete(Delete),
    /// Requests (and, populated, answers) the page catalog.
    ListPages(ListPages),
    /// Requests (and, populated, answers) the syncable catalog.
    ListSyncables(ListSyncables),
}

impl Message {
    /// Returns the message type code.
    pub fn type_code(&self) -> u8 {
        match self {
            Message::AuthRequest(_) => 1,
            Message::AuthResponse(_) => 2,
            Message::Begin => 3,
            Message::End => 4,
            Message::Finish => 5,
            Message::Ack(_) => 6,
            Message::Error(_) => 7,
            Message::Ping => 8,
            Message::PullExport(_) => 9,
            Message::PullNode(_) => 10,
            Message::PullRelationship(_) => 11,
            Message::PullFile(_) => 12,
            Message::PullChunk(_) => 13,
            Message::PushExport(_) => 14,
            Message::Node(_) => 15,
            Message::Relationship(_) => 16,
            Message::FileBegin(_) => 17,
            Message::FileChunk(_) => 18,
            Message::FileEnd(_) => 19,
            Message::Delete(_) => 20,
            Message::ListPages(_) => 21,
            Message::ListSyncables(_) => 22,
        }
    }

    /// Returns the message name, for logging and acks.
    pub fn name(&self) -> &'static str {
        match self {
            Message::AuthRequest(_) => "AuthRequest",
            Message::AuthResponse(_) => "AuthResponse",
            Message::Begin => "Begin",
            Message::End => "End",
            Message::Finish => "Finish",
            Message::Ack(_) => "Ack",
            Message::Error(_) => "Error",
            Message::Ping => "Ping",
            Message::PullExport(_) => "PullExport",
            Message::PullNode(_) => "PullNode",
            Message::PullRelationship(_) => "PullRelationship",
            Message::PullFile(_) => "PullFile",
            Message::PullChunk(_) => "PullChunk",
            Message::PushExport(_) => "PushExport",
            Message::Node(_) => "Node",
            Message::Relationship(_) => "Relationship",
            Message::FileBegin(_) => "FileBegin",
            Message::FileChunk(_) => "FileChunk",
            Message::FileEnd(_) => "FileEnd",
            Message::Delete(_) => "Delete",
            Message::ListPages(_) => "ListPages",
            Message::ListSyncables(_) => "ListSyncables",
        }
    }

    /// Encodes the message: type code, then fields in declared order.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(64);
        match self {
            Message::AuthRequest(m) => m.encode_fields(&mut w),
            Message::AuthResponse(m) => m.encode_fields(&mut w),
            Message::Begin | Message::End | Message::Finish | Message::Ping => {}
            Message::Ack(m) => m.encode_fields(&mut w),
            Message::Error(m) => m.encode_fields(&mut w),
            Message::PullExport(m) => m.encode_fields(&mut w),
            Message::PullNode(m) => m.encode_fields(&mut w),
            Message::PullRelationship(m) => m.encode_fields(&mut w),
            Message::PullFile(m) => m.encode_fields(&mut w),
            Message::PullChunk(m) => m.encode_fields(&mut w),
            Message::PushExport(m) => m.encode_fields(&mut w),
            Message::Node(m) => m.encode_fields(&mut w),
            Message::Relationship(m) => m.encode_fields(&mut w),
            Message::FileBegin(m) => m.encode_fields(&mut w),
            Message::FileChunk(m) => m.encode_fields(&mut w),
            Message::FileEnd(m) => m.encode_fields(&mut w),
            Message::Delete(m) => m.encode_fields(&mut w),
            Message::ListPages(m) => m.encode_fields(&mut w),
            Message::ListSyncables(m) => m.encode_fields(&mut w),
        }

        let mut out = Vec::with_capacity(1 + w.len());
        out.push(self.type_code());
        out.extend_from_slice(w.as_bytes());
        out
    }

    /// Decodes a message from one frame.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let (&code, rest) = bytes.split_first().ok_or(ProtocolError::EmptyFrame)?;
        let mut r = Reader::new(rest);

        let message = match code {
            1 => Message::AuthRequest(AuthRequest::decode_fields(&mut r)?),
            2 => Message::AuthResponse(AuthResponse::decode_fields(&mut r)?),
            3 => Message::Begin,
            4 => Message::End,
            5 => Message::Finish,
            6 => Message::Ack(Ack::decode_fields(&mut r)?),
            7 => Message::Error(ErrorReply::decode_fields(&mut r)?),
            8 => Message::Ping,
            9 => Message::PullExport(PullExport::decode_fields(&mut r)?),
            10 => Message::PullNode(PullNode::decode_fields(&mut r)?),
            11 => Message::PullRelationship(PullRelationship::decode_fields(&mut r)?),
            12 => Message::PullFile(PullFile::decode_fields(&mut r)?),
            13 => Message::PullChunk(PullChunk::decode_fields(&mut r)?),
            14 => Message::PushExport(PushExport::decode_fields(&mut r)?),
            15 => Message::Node(NodeContainer::decode_fields(&mut r)?),
            16 => Message::Relationship(RelationshipContainer::decode_fields(&mut r)?),
            17 => Message::FileBegin(FileContainer::decode_fields(&mut r)?),
            18 => Message::FileChunk(FileChunk::decode_fields(&mut r)?),
            19 => Message::FileEnd(FileEnd::decode_fields(&mut r)?),
            20 => Message::Delete(Delete::decode_fields(&mut r)?),
            21 => Message::ListPages(ListPages::decode_fields(&mut r)?),
            22 => Message::ListSyncables(ListSyncables::decode_fields(&mut r)?),
            code => return Err(ProtocolError::UnknownTypeCode(code)),
        };

        if !r.is_empty() {
            return Err(ProtocolError::TrailingBytes(r.remaining()));
        }
        Ok(message)
    }
}

impl From<NodeContainer> for Message {
    fn from(c: NodeContainer) -> Self {
        Message::Node(c)
    }
}

impl From<RelationshipContainer> for Message {
    fn from(c: RelationshipContainer) -> Self {
        Message::Relationship(c)
    }
}

impl From<FileContainer> for Message {
    fn from(c: FileContainer) -> Self {
        Message::FileBegin(c)
    }
}

/// Opens the authentication handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Name of the principal authenticating.
    pub user_name: String,
    /// Requested symmetric key length in bytes.
    pub key_length: u32,
}

impl AuthRequest {
    /// Creates a handshake request.
    pub fn new(user_name: impl Into<String>, key_length: u32) -> Self {
        Self {
            user_name: user_name.into(),
            key_length,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.user_name);
        w.put_i32(self.key_length as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            user_name: r.get_str()?,
            key_length: r.get_i32()? as u32,
        })
    }
}

/// Answers the handshake.
///
/// Carries the at-rest password blob and the salt; the session key
/// itself never crosses the wire — both ends derive it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    /// Name of the authenticated principal.
    pub user_name: String,
    /// The principal's at-rest encrypted password blob.
    pub password_hash: Vec<u8>,
    /// The principal's salt, when one is set.
    pub salt: Option<String>,
    /// Negotiated key length in bytes, after server-side clamping.
    pub key_length: u32,
}

impl AuthResponse {
    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.user_name);
        w.put_bytes(&self.password_hash);
        w.put_opt_str(self.salt.as_deref());
        w.put_i32(self.key_length as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            user_name: r.get_str()?,
            password_hash: r.get_bytes()?,
            salt: r.get_opt_str()?,
            key_length: r.get_i32()? as u32,
        })
    }
}

/// Generic acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// What is being acknowledged.
    pub message: String,
    /// Sequence number of the acknowledged unit, where applicable.
    pub sequence: u32,
}

impl Ack {
    /// Creates an acknowledgment.
    pub fn new(message: impl Into<String>, sequence: u32) -> Self {
        Self {
            message: message.into(),
            sequence,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.message);
        w.put_i32(self.sequence as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            message: r.get_str()?,
            sequence: r.get_i32()? as u32,
        })
    }
}

/// Carries a fatal condition to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl ErrorReply {
    /// Creates an error reply.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The handshake rejection sent for unknown users and bad
    /// credentials alike.
    pub fn unauthorized() -> Self {
        Self::new(crate::ERROR_UNAUTHORIZED, "Wrong username or password.")
    }

    /// An unresolvable entity or stale transfer key.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(crate::ERROR_NOT_FOUND, what)
    }

    /// An internal failure surfaced to the peer.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(crate::ERROR_INTERNAL, message)
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_i32(self.code);
        w.put_str(&self.message);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            code: r.get_i32()?,
            message: r.get_str()?,
        })
    }
}

/// Requests resolution of an export set, and carries the result back.
///
/// The client sends `key = None` and zero counts; the server resolves
/// the set, stashes it under a fresh transfer key, and echoes the
/// message back populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullExport {
    /// Id of the root entity to export.
    pub root_id: String,
    /// Follow the transitive closure, or stop at immediate
    /// relationships.
    pub recursive: bool,
    /// Transfer key, populated by the server.
    pub key: Option<String>,
    /// Node count of the resolved set, populated by the server.
    pub num_nodes: u32,
    /// Relationship count of the resolved set, populated by the
    /// server.
    pub num_rels: u32,
}

impl PullExport {
    /// Creates the client-side request.
    pub fn request(root_id: impl Into<String>, recursive: bool) -> Self {
        Self {
            root_id: root_id.into(),
            recursive,
            key: None,
            num_nodes: 0,
            num_rels: 0,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.root_id);
        w.put_bool(self.recursive);
        w.put_opt_str(self.key.as_deref());
        w.put_i32(self.num_nodes as i32);
        w.put_i32(self.num_rels as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            root_id: r.get_str()?,
            recursive: r.get_bool()?,
            key: r.get_opt_str()?,
            num_nodes: r.get_i32()? as u32,
            num_rels: r.get_i32()? as u32,
        })
    }
}

/// Requests one node of a resolved export set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullNode {
    /// Transfer key returned by `PullExport`.
    pub key: String,
    /// Index into the export set's node list.
    pub index: u32,
}

impl PullNode {
    /// Creates a node pull request.
    pub fn new(key: impl Into<String>, index: u32) -> Self {
        Self {
            key: key.into(),
            index,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.key);
        w.put_i32(self.index as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            key: r.get_str()?,
            index: r.get_i32()? as u32,
        })
    }
}

/// Requests one relationship of a resolved export set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRelationship {
    /// Transfer key returned by `PullExport`.
    pub key: String,
    /// Index into the export set's relationship list.
    pub index: u32,
}

impl PullRelationship {
    /// Creates a relationship pull request.
    pub fn new(key: impl Into<String>, index: u32) -> Self {
        Self {
            key: key.into(),
            index,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.key);
        w.put_i32(self.index as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            key: r.get_str()?,
            index: r.get_i32()? as u32,
        })
    }
}

/// Requests the file transfer for one node of an export set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullFile {
    /// Transfer key returned by `PullExport`.
    pub key: String,
    /// Index into the export set's node list.
    pub node_index: u32,
}

impl PullFile {
    /// Creates a file pull request.
    pub fn new(key: impl Into<String>, node_index: u32) -> Self {
        Self {
            key: key.into(),
            node_index,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.key);
        w.put_i32(self.node_index as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            key: r.get_str()?,
            node_index: r.get_i32()? as u32,
        })
    }
}

/// Requests the next chunk of an open file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullChunk {
    /// Container id correlating the chunk stream.
    pub container_id: String,
    /// Sequence number of the requested chunk.
    pub sequence: u32,
    /// Declared file size, repeated on every request.
    pub file_size: u64,
}

impl PullChunk {
    /// Creates a chunk pull request.
    pub fn new(container_id: impl Into<String>, sequence: u32, file_size: u64) -> Self {
        Self {
            container_id: container_id.into(),
            sequence,
            file_size,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.container_id);
        w.put_i32(self.sequence as i32);
        w.put_long(self.file_size as i64);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            container_id: r.get_str()?,
            sequence: r.get_i32()? as u32,
            file_size: r.get_long()? as u64,
        })
    }
}

/// Announces a push-path bulk transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushExport {
    /// Number of node containers that will follow.
    pub num_nodes: u32,
    /// Number of relationship containers that will follow.
    pub num_rels: u32,
}

impl PushExport {
    /// Creates a push announcement.
    pub fn new(num_nodes: u32, num_rels: u32) -> Self {
        Self {
            num_nodes,
            num_rels,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_i32(self.num_nodes as i32);
        w.put_i32(self.num_rels as i32);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            num_nodes: r.get_i32()? as u32,
            num_rels: r.get_i32()? as u32,
        })
    }
}

/// One chunk of file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
    /// Container id correlating the chunk stream.
    pub container_id: String,
    /// Position of this chunk in the stream.
    pub sequence: u32,
    /// Declared size of the whole file.
    pub file_size: u64,
    /// The chunk's bytes.
    pub data: Vec<u8>,
}

impl FileChunk {
    /// Creates a file chunk.
    pub fn new(
        container_id: impl Into<String>,
        sequence: u32,
        file_size: u64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            sequence,
            file_size,
            data,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.container_id);
        w.put_i32(self.sequence as i32);
        w.put_long(self.file_size as i64);
        w.put_bytes(&self.data);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            container_id: r.get_str()?,
            sequence: r.get_i32()? as u32,
            file_size: r.get_long()? as u64,
            data: r.get_bytes()?,
        })
    }
}

/// Terminates a chunked file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEnd {
    /// Container id of the completed stream.
    pub container_id: String,
    /// Declared size of the transferred file.
    pub file_size: u64,
}

impl FileEnd {
    /// Creates an end marker.
    pub fn new(container_id: impl Into<String>, file_size: u64) -> Self {
        Self {
            container_id: container_id.into(),
            file_size,
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.container_id);
        w.put_long(self.file_size as i64);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            container_id: r.get_str()?,
            file_size: r.get_long()? as u64,
        })
    }
}

/// Deletes a remote entity by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    /// Id of the node or relationship to delete.
    pub entity_id: String,
}

impl Delete {
    /// Creates a deletion request.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
        }
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_str(&self.entity_id);
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: r.get_str()?,
        })
    }
}

/// The page catalog query. Travels empty as a request and populated
/// as the reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPages {
    /// Names of the pages on the answering instance.
    pub names: Vec<String>,
}

impl ListPages {
    /// Creates the client-side request.
    pub fn request() -> Self {
        Self::default()
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_i32(self.names.len() as i32);
        for name in &self.names {
            w.put_str(name);
        }
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        let count = r.get_i32()? as u32;
        let mut names = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            names.push(r.get_str()?);
        }
        Ok(Self { names })
    }
}

/// The syncable catalog query. Travels empty as a request and
/// populated as the reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSyncables {
    /// Every entity eligible for cloud transfer.
    pub syncables: Vec<SyncableInfo>,
}

impl ListSyncables {
    /// Creates the client-side request.
    pub fn request() -> Self {
        Self::default()
    }

    fn encode_fields(&self, w: &mut Writer) {
        w.put_i32(self.syncables.len() as i32);
        for info in &self.syncables {
            info.encode_fields(w);
        }
    }

    fn decode_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        let count = r.get_i32()? as u32;
        let mut syncables = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            syncables.push(SyncableInfo::decode_fields(r)?);
        }
        Ok(Self { syncables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::SyncableKind;
    use graphsync_codec::Value;

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::AuthRequest(AuthRequest::new("alice", 32)),
            Message::AuthResponse(AuthResponse {
                user_name: "alice".into(),
                password_hash: vec![9, 8, 7],
                salt: Some("abc123".into()),
                key_length: 32,
            }),
            Message::Begin,
            Message::End,
            Message::Finish,
            Message::Ack(Ack::new("Begin", 0)),
            Message::Error(ErrorReply::unauthorized()),
            Message::Ping,
            Message::PullExport(PullExport::request("root-id", true)),
            Message::PullNode(PullNode::new("k", 0)),
            Message::PullRelationship(PullRelationship::new("k", 1)),
            Message::PullFile(PullFile::new("k", 2)),
            Message::PullChunk(PullChunk::new("c", 3, 4096)),
            Message::PushExport(PushExport::new(2, 1)),
            Message::Node(
                NodeContainer::new("n1", "Page").with_property("name", Value::Text("home".into())),
            ),
            Message::Relationship(RelationshipContainer::new("n1", "n2", "r1", "CONTAINS")),
            Message::FileBegin(FileContainer::new("f1", "logo.png", 1234)),
            Message::FileChunk(FileChunk::new("c", 0, 1234, vec![1, 2, 3])),
            Message::FileEnd(FileEnd::new("c", 1234)),
            Message::Delete(Delete::new("n9")),
            Message::ListPages(ListPages {
                names: vec!["home".into(), "about".into()],
            }),
            Message::ListSyncables(ListSyncables {
                syncables: vec![SyncableInfo {
                    id: "n1".into(),
                    name: Some("home".into()),
                    kind: SyncableKind::Node,
                    entity_type: "Page".into(),
                }],
            }),
        ]
    }

    #[test]
    fn every_variant_roundtrips() {
        for message in sample_messages() {
            let bytes = message.encode();
            let decoded = Message::decode(&bytes).unwrap();
            assert_eq!(decoded, message, "variant {}", message.name());
        }
    }

    #[test]
    fn type_codes_are_stable_and_distinct() {
        let codes: Vec<u8> = sample_messages().iter().map(Message::type_code).collect();
        let expected: Vec<u8> = (1..=22).collect();
        assert_eq!(codes, expected);
    }

    #[test]
    fn unknown_type_code_is_rejected() {
        assert_eq!(
            Message::decode(&[0xEE]).unwrap_err(),
            ProtocolError::UnknownTypeCode(0xEE)
        );
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert_eq!(Message::decode(&[]).unwrap_err(), ProtocolError::EmptyFrame);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = Message::Ping.encode();
        bytes.push(0);
        assert_eq!(
            Message::decode(&bytes).unwrap_err(),
            ProtocolError::TrailingBytes(1)
        );
    }

    #[test]
    fn pull_export_request_is_unpopulated() {
        let request = PullExport::request("root", false);
        assert_eq!(request.key, None);
        assert_eq!(request.num_nodes, 0);
        assert_eq!(request.num_rels, 0);
    }

    #[test]
    fn auth_response_without_salt_roundtrips() {
        let message = Message::AuthResponse(AuthResponse {
            user_name: "bob".into(),
            password_hash: vec![],
            salt: None,
            key_length: 16,
        });
        let decoded = Message::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
    }
}
