//! Client-side command implementations.

use graphsync_client::{ClientConfig, SyncClient};
use graphsync_protocol::{FileContainer, SyncableKind};
use std::path::Path;
use tokio::net::TcpStream;
use tracing::info;

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn open_session(
    server: &str,
    user: &str,
    password: &str,
) -> Result<SyncClient<TcpStream>, Box<dyn std::error::Error>> {
    let mut client = SyncClient::connect(server, ClientConfig::new()).await?;
    client.authenticate(user, password).await?;
    Ok(client)
}

/// Runs the pull command.
pub async fn pull(
    server: &str,
    user: &str,
    password: &str,
    root: &str,
    recursive: bool,
    dest: &Path,
) -> CliResult {
    let mut client = open_session(server, user, password).await?;
    client.begin().await?;
    let report = client.pull(root, recursive, dest).await?;
    client.finish().await?;

    info!(
        nodes = report.nodes.len(),
        rels = report.rels.len(),
        files = report.files.len(),
        "pull finished"
    );
    for node in &report.nodes {
        println!("node {} ({})", node.source_node_id, node.node_type);
    }
    for rel in &report.rels {
        println!(
            "rel  {} -[{}]-> {}",
            rel.source_start_id, rel.rel_type, rel.source_end_id
        );
    }
    for file in &report.files {
        println!("file {}", file.display());
    }
    Ok(())
}

/// Runs the push-file command.
pub async fn push_file(server: &str, user: &str, password: &str, path: &Path) -> CliResult {
    let content = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or("path has no file name")?;

    let mut client = open_session(server, user, password).await?;
    client.begin().await?;

    let id = format!("file-{name}");
    let container = FileContainer::new(&id, &name, content.len() as u64);
    client
        .push_file(container, &mut std::io::Cursor::new(content))
        .await?;
    client.finish().await?;

    println!("pushed {} as {id}", path.display());
    Ok(())
}

/// Runs the list-pages command.
pub async fn list_pages(server: &str, user: &str, password: &str) -> CliResult {
    let mut client = open_session(server, user, password).await?;
    let pages = client.list_pages().await?;
    client.finish().await?;

    for name in pages {
        println!("{name}");
    }
    Ok(())
}

/// Runs the list-syncables command.
pub async fn list_syncables(server: &str, user: &str, password: &str) -> CliResult {
    let mut client = open_session(server, user, password).await?;
    let syncables = client.list_syncables().await?;
    client.finish().await?;

    for info in syncables {
        let kind = match info.kind {
            SyncableKind::Node => "node",
            SyncableKind::Relationship => "rel ",
        };
        let name = info.name.as_deref().unwrap_or("-");
        println!("{kind} {} {} ({})", info.id, name, info.entity_type);
    }
    Ok(())
}

/// Runs the delete command.
pub async fn delete(server: &str, user: &str, password: &str, id: &str) -> CliResult {
    let mut client = open_session(server, user, password).await?;
    client.begin().await?;
    client.delete(id).await?;
    client.finish().await?;

    println!("deleted {id}");
    Ok(())
}

/// Runs the ping command.
pub async fn ping(server: &str, user: &str, password: &str) -> CliResult {
    let mut client = open_session(server, user, password).await?;
    client.ping().await?;
    client.end().await?;

    println!("pong");
    Ok(())
}
