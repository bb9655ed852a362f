//! # GraphSync Protocol
//!
//! Message catalog and data containers for the GraphSync cloud
//! synchronization protocol.
//!
//! This crate provides:
//! - [`Message`] — the closed set of protocol message variants
//! - [`NodeContainer`], [`RelationshipContainer`], [`FileContainer`] —
//!   the serialized entity payloads
//! - [`ChunkGuard`] — the sequence/size invariants of chunked file
//!   transfer
//! - the constants both peers must agree on
//!
//! This is a pure protocol crate with no I/O operations. Every message
//! serializes its fields through explicit codec calls in a fixed order
//! that encode and decode keep in lock-step; there is no
//! self-describing schema on the wire.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod container;
mod error;
mod message;
mod transfer;

pub use container::{
    FileContainer, NodeContainer, PropertyMap, RelationshipContainer, SyncableInfo, SyncableKind,
};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    Ack, AuthRequest, AuthResponse, Delete, ErrorReply, FileChunk, FileEnd, ListPages,
    ListSyncables, Message, PullChunk, PullExport, PullFile, PullNode, PullRelationship,
    PushExport,
};
pub use transfer::{expected_chunks, ChunkGuard};

/// Protocol version spoken by this implementation.
pub const PROTOCOL_VERSION: u32 = 1;

/// Fixed size of one file chunk in bytes.
///
/// Configuration, not negotiated: both peers must be deployed with the
/// same value.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Maximum symmetric key length in bytes this build supports.
pub const MAX_KEY_LEN: usize = 32;

/// Identifier of the symmetric cipher both peers must agree on.
pub const CIPHER_ALGORITHM: &str = "aes-gcm";

/// Error code for authentication failures.
pub const ERROR_UNAUTHORIZED: i32 = 401;

/// Error code for unresolvable entities and stale transfer keys.
pub const ERROR_NOT_FOUND: i32 = 404;

/// Error code for internal failures surfaced to the peer.
pub const ERROR_INTERNAL: i32 = 500;
