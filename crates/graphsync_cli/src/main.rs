//! GraphSync CLI
//!
//! Command-line tools for running and exercising a GraphSync
//! instance.
//!
//! # Commands
//!
//! - `serve` - Run a sync server over the in-memory reference store
//! - `pull` - Pull an export set from a server
//! - `push-file` - Push one file to a server
//! - `list-pages` / `list-syncables` - Query the remote catalogs
//! - `delete` - Delete a remote entity by id
//! - `ping` - Round-trip a keepalive

mod commands;

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GraphSync command-line tools.
#[derive(Parser)]
#[command(name = "graphsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Connection parameters shared by every client command.
#[derive(Args)]
struct ConnectArgs {
    /// Server address to connect to
    #[arg(long, default_value = "127.0.0.1:7473")]
    server: String,

    /// Principal to authenticate as
    #[arg(short, long)]
    user: String,

    /// Password of the principal
    #[arg(short, long)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sync server over the in-memory reference store
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1:7473")]
        bind: SocketAddr,

        /// Principal accepted by the handshake
        #[arg(long, default_value = "alice")]
        user: String,

        /// Password of the principal
        #[arg(long, default_value = "secret")]
        password: String,

        /// Salt of the principal
        #[arg(long)]
        salt: Option<String>,

        /// JSON fixture to seed the graph from
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Pull the export set of a root entity
    Pull {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Id of the root entity
        root: String,

        /// Follow the transitive closure
        #[arg(short, long)]
        recursive: bool,

        /// Directory to write pulled files into
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },

    /// Push one file to the server
    PushFile {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Path of the file to push
        path: PathBuf,
    },

    /// List the names of the remote pages
    ListPages {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// List every remote entity eligible for sync
    ListSyncables {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Delete a remote entity by id
    Delete {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Id of the entity to delete
        id: String,
    },

    /// Round-trip a keepalive
    Ping {
        #[command(flatten)]
        connect: ConnectArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            bind,
            user,
            password,
            salt,
            seed,
        } => commands::serve::run(bind, &user, &password, salt, seed.as_deref()).await?,
        Commands::Pull {
            connect,
            root,
            recursive,
            dest,
        } => {
            commands::remote::pull(
                &connect.server,
                &connect.user,
                &connect.password,
                &root,
                recursive,
                &dest,
            )
            .await?;
        }
        Commands::PushFile { connect, path } => {
            commands::remote::push_file(&connect.server, &connect.user, &connect.password, &path)
                .await?;
        }
        Commands::ListPages { connect } => {
            commands::remote::list_pages(&connect.server, &connect.user, &connect.password).await?;
        }
        Commands::ListSyncables { connect } => {
            commands::remote::list_syncables(&connect.server, &connect.user, &connect.password)
                .await?;
        }
        Commands::Delete { connect, id } => {
            commands::remote::delete(&connect.server, &connect.user, &connect.password, &id)
                .await?;
        }
        Commands::Ping { connect } => {
            commands::remote::ping(&connect.server, &connect.user, &connect.password).await?;
        }
    }

    Ok(())
}
