//! Stored entity records.

use graphsync_codec::Value;
use graphsync_protocol::PropertyMap;
use sha2::{Digest, Sha256};

/// A stored graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Node id.
    pub id: String,
    /// Type name.
    pub node_type: String,
    /// Properties in storage order.
    pub properties: PropertyMap,
}

impl NodeRecord {
    /// Creates a node record.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.push((key.into(), value));
        self
    }

    /// Returns a text property by key.
    pub fn property_text(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_text())
    }

    /// Returns the node's display name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.property_text("name")
    }

    /// Returns true if this node carries file content.
    pub fn is_file(&self) -> bool {
        self.node_type == "File"
    }
}

/// A stored graph relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRecord {
    /// Relationship id.
    pub id: String,
    /// Id of the start node.
    pub start_id: String,
    /// Id of the end node.
    pub end_id: String,
    /// Type name.
    pub rel_type: String,
    /// Properties in storage order.
    pub properties: PropertyMap,
}

impl RelationshipRecord {
    /// Creates a relationship record.
    pub fn new(
        id: impl Into<String>,
        start_id: impl Into<String>,
        end_id: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_id: start_id.into(),
            end_id: end_id.into(),
            rel_type: rel_type.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.push((key.into(), value));
        self
    }
}

/// A stored principal.
#[derive(Clone)]
pub struct Principal {
    /// Login name.
    pub user_name: String,
    /// The credential both ends derive the session key from.
    pub secret: String,
    /// Salt, when one is set for this principal.
    pub salt: Option<String>,
    /// At-rest encrypted password blob, sent on the wire during the
    /// handshake but never an input to key derivation.
    pub password_hash: Vec<u8>,
}

impl Principal {
    /// Creates a principal, computing the at-rest password blob.
    pub fn new(
        user_name: impl Into<String>,
        password: impl Into<String>,
        salt: Option<String>,
    ) -> Self {
        let user_name = user_name.into();
        let password = password.into();

        let mut hasher = Sha256::new();
        if let Some(ref salt) = salt {
            hasher.update(salt.as_bytes());
        }
        hasher.update(password.as_bytes());
        let password_hash = hasher.finalize().to_vec();

        Self {
            user_name,
            secret: password,
            salt,
            password_hash,
        }
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("user_name", &self.user_name)
            .field("secret", &"[REDACTED]")
            .field("salt", &self.salt)
            .finish_non_exhaustive()
    }
}
