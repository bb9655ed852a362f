//! End-to-end sessions: a real client driving a real server over an
//! in-memory duplex stream.

use graphsync_client::{ClientConfig, ClientError, SyncClient};
use graphsync_codec::Value;
use graphsync_protocol::{FileContainer, NodeContainer, RelationshipContainer, SyncableKind};
use graphsync_server::{serve_stream, ServerConfig, SharedStores};
use graphsync_store::{GraphStore, MemoryStore, Principal};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::DuplexStream;

fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_principal(Principal::new("alice", "secret", Some("abc123".into())));
    Arc::new(store)
}

fn start_session(store: Arc<MemoryStore>) -> SyncClient<DuplexStream> {
    let (client_side, server_side) = tokio::io::duplex(256 * 1024);
    let config = ServerConfig::default().with_chunk_size(1024);
    tokio::spawn(async move {
        let _ = serve_stream(server_side, SharedStores::single(store), config).await;
    });

    let config = ClientConfig::new()
        .with_chunk_size(1024)
        .with_request_timeout(Duration::from_secs(5));
    SyncClient::over(client_side, config)
}

#[tokio::test]
async fn full_session_against_a_two_relationship_root() {
    let store = seeded_store();
    let root = store.create_node("Page", "home");
    let header = store.create_node("Content", "header");
    let footer = store.create_node("Content", "footer");
    store.create_relationship(&root, &header, "CONTAINS");
    store.create_relationship(&root, &footer, "CONTAINS");

    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();
    assert!(client.connection().is_encrypted());
    assert_eq!(client.connection().principal(), Some("alice"));

    client.begin().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let report = client.pull(&root, false, dir.path()).await.unwrap();

    assert_eq!(report.nodes.len(), 1);
    assert_eq!(report.nodes[0].source_node_id, root);
    assert_eq!(report.rels.len(), 2);
    assert!(report.files.is_empty());

    client.finish().await.unwrap();
}

#[tokio::test]
async fn wrong_password_breaks_the_sealed_channel() {
    let store = seeded_store();
    let mut client = start_session(store);

    // The handshake itself succeeds: the server cannot tell a wrong
    // password apart at this point. The keys diverge, so the first
    // sealed exchange fails instead.
    client.authenticate("alice", "hunter2").await.unwrap();
    assert!(client.begin().await.is_err());
}

#[tokio::test]
async fn unknown_user_is_rejected_with_401() {
    let store = seeded_store();
    let mut client = start_session(store);

    let err = client.authenticate("mallory", "secret").await.unwrap_err();
    match err {
        ClientError::Server(reply) => {
            assert_eq!(reply.code, 401);
            assert_eq!(reply.message, "Wrong username or password.");
        }
        other => panic!("expected server error, got {other}"),
    }
    assert_eq!(client.connection().last_error().unwrap().code, 401);
}

#[tokio::test]
async fn recursive_pull_covers_the_closure() {
    let store = seeded_store();
    let root = store.create_node("Page", "home");
    let a = store.create_node("Content", "a");
    let b = store.create_node("Content", "b");
    store.create_relationship(&root, &a, "CONTAINS");
    store.create_relationship(&a, &b, "CONTAINS");

    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let flat = client.pull(&root, false, dir.path()).await.unwrap();
    let deep = client.pull(&root, true, dir.path()).await.unwrap();

    assert_eq!(flat.nodes.len(), 1);
    assert_eq!(flat.rels.len(), 1);
    assert_eq!(deep.nodes.len(), 3);
    assert_eq!(deep.rels.len(), 2);
}

#[tokio::test]
async fn file_transfer_lands_on_disk() {
    let store = seeded_store();
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let file = store.create_file("assets/logo.png", &content);

    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let report = client.pull(&file, false, dir.path()).await.unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0], dir.path().join("assets/logo.png"));
    assert_eq!(std::fs::read(&report.files[0]).unwrap(), content);
}

#[tokio::test]
async fn empty_file_transfer_lands_on_disk() {
    let store = seeded_store();
    let file = store.create_file("empty.txt", b"");

    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let report = client.pull(&file, false, dir.path()).await.unwrap();

    assert_eq!(std::fs::read(&report.files[0]).unwrap(), b"");
}

#[tokio::test]
async fn push_stores_entities_transactionally() {
    let store = seeded_store();
    let mut client = start_session(store.clone());
    client.authenticate("alice", "secret").await.unwrap();
    client.begin().await.unwrap();

    let nodes = vec![
        NodeContainer::new("n1", "Page").with_property("name", Value::Text("home".into())),
        NodeContainer::new("n2", "Page").with_property("name", Value::Text("about".into())),
    ];
    let rels = vec![RelationshipContainer::new("n1", "n2", "r1", "LINKS_TO")];
    client.push(nodes, rels).await.unwrap();

    // Still invisible: the bracket has not been committed.
    assert_eq!(store.node_count(), 0);

    client.finish().await.unwrap();
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.relationship_count(), 1);
    assert_eq!(store.node("n1").unwrap().name(), Some("home"));
}

#[tokio::test]
async fn duplicate_relationships_are_deduplicated_on_push() {
    let store = seeded_store();
    let mut client = start_session(store.clone());
    client.authenticate("alice", "secret").await.unwrap();
    client.begin().await.unwrap();

    let nodes = vec![
        NodeContainer::new("n1", "Page"),
        NodeContainer::new("n2", "Page"),
    ];
    // Same type and endpoints, different ids and properties: one
    // relationship must survive.
    let rels = vec![
        RelationshipContainer::new("n1", "n2", "r1", "LINKS_TO"),
        RelationshipContainer::new("n1", "n2", "r2", "LINKS_TO")
            .with_property("weight", Value::Int(9)),
    ];
    client.push(nodes, rels).await.unwrap();
    client.finish().await.unwrap();

    assert_eq!(store.relationship_count(), 1);
}

#[tokio::test]
async fn push_file_roundtrips_content() {
    let store = seeded_store();
    let content = vec![0x5Au8; 4000];

    let mut client = start_session(store.clone());
    client.authenticate("alice", "secret").await.unwrap();
    client.begin().await.unwrap();

    let container = FileContainer::new("f1", "upload.bin", content.len() as u64);
    client
        .push_file(container, &mut std::io::Cursor::new(content.clone()))
        .await
        .unwrap();
    client.finish().await.unwrap();

    assert_eq!(store.file_content("f1").unwrap(), content);
    assert!(store.node("f1").unwrap().is_file());
}

#[tokio::test]
async fn catalog_queries() {
    let store = seeded_store();
    let home = store.create_node("Page", "home");
    store.create_node("Page", "about");
    let file = store.create_file("logo.png", b"png");
    store.create_relationship(&home, &file, "CONTAINS");

    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();

    let mut pages = client.list_pages().await.unwrap();
    pages.sort();
    assert_eq!(pages, vec!["about".to_string(), "home".to_string()]);

    let syncables = client.list_syncables().await.unwrap();
    assert_eq!(syncables.len(), 4);
    let rels = syncables
        .iter()
        .filter(|s| s.kind == SyncableKind::Relationship)
        .count();
    assert_eq!(rels, 1);
}

#[tokio::test]
async fn delete_removes_the_entity_after_commit() {
    let store = seeded_store();
    let doomed = store.create_node("Page", "old");

    let mut client = start_session(store.clone());
    client.authenticate("alice", "secret").await.unwrap();
    client.begin().await.unwrap();
    client.delete(&doomed).await.unwrap();

    assert!(store.node(&doomed).is_some());
    client.finish().await.unwrap();
    assert!(store.node(&doomed).is_none());
}

#[tokio::test]
async fn ping_keeps_the_session_alive() {
    let store = seeded_store();
    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();

    let before = client.connection().progress();
    client.ping().await.unwrap();
    client.ping().await.unwrap();
    assert_eq!(client.connection().progress(), before + 2);
}

#[tokio::test]
async fn pull_of_an_unknown_root_is_a_server_error_not_a_hang() {
    let store = seeded_store();
    let mut client = start_session(store);
    client.authenticate("alice", "secret").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = client.pull("ghost", false, dir.path()).await.unwrap_err();
    match err {
        ClientError::Server(reply) => assert_eq!(reply.code, 404),
        other => panic!("expected server error, got {other}"),
    }
}
