//! Serve command implementation.

use graphsync_codec::Value;
use graphsync_server::{ServerConfig, SharedStores, SyncServer};
use graphsync_store::{MemoryStore, NodeRecord, Principal, RelationshipRecord};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A graph fixture loaded from JSON to seed the reference store.
#[derive(Debug, Deserialize)]
struct SeedFixture {
    #[serde(default)]
    nodes: Vec<SeedNode>,
    #[serde(default)]
    relationships: Vec<SeedRelationship>,
    #[serde(default)]
    files: Vec<SeedFile>,
}

#[derive(Debug, Deserialize)]
struct SeedNode {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeedRelationship {
    id: String,
    start: String,
    end: String,
    #[serde(rename = "type")]
    rel_type: String,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    id: String,
    name: String,
    /// Path of the content on disk, relative to the fixture.
    path: String,
}

/// Runs the serve command.
pub async fn run(
    bind: SocketAddr,
    user: &str,
    password: &str,
    salt: Option<String>,
    seed: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    store.add_principal(Principal::new(user, password, salt));

    if let Some(seed) = seed {
        let count = load_fixture(&store, seed)?;
        info!(fixture = %seed.display(), entities = count, "store seeded");
    }

    let server = SyncServer::new(ServerConfig::new(bind), SharedStores::single(store));
    server.run().await?;
    Ok(())
}

fn load_fixture(store: &MemoryStore, path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let fixture: SeedFixture = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut count = 0;

    for node in fixture.nodes {
        let mut record = NodeRecord::new(&node.id, &node.node_type);
        for (key, value) in node.properties {
            record = record.with_property(key, json_to_value(value));
        }
        store.insert_node(record);
        count += 1;
    }

    for rel in fixture.relationships {
        store.insert_relationship(RelationshipRecord::new(
            &rel.id, &rel.start, &rel.end, &rel.rel_type,
        ));
        count += 1;
    }

    for file in fixture.files {
        let content = std::fs::read(base.join(&file.path))?;
        store.insert_node(
            NodeRecord::new(&file.id, "File")
                .with_property("name", Value::Text(file.name.clone()))
                .with_property("size", Value::Long(content.len() as i64)),
        );
        store.set_file_content(&file.id, content);
        count += 1;
    }

    Ok(count)
}

fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Long)
            .unwrap_or_else(|| Value::Text(n.to_string())),
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_value_mapping() {
        assert_eq!(json_to_value(serde_json::json!(null)), Value::Null);
        assert_eq!(json_to_value(serde_json::json!(true)), Value::Bool(true));
        assert_eq!(json_to_value(serde_json::json!(42)), Value::Long(42));
        assert_eq!(
            json_to_value(serde_json::json!("home")),
            Value::Text("home".into())
        );
    }
}
