//! # GraphSync Server
//!
//! The server role of the GraphSync protocol.
//!
//! This crate provides:
//! - [`SyncServer`] — TCP accept loop, one task per connection
//! - [`serve_stream`] — drives one connection over any duplex stream
//!   (tests run it over an in-memory pipe)
//! - the per-variant message dispatch: handshake, transaction
//!   bracket, export-set resolution, client-paced bulk pull, acked
//!   push, chunked file transfer, catalog queries
//!
//! # Concurrency
//!
//! Each connection is strictly half-duplex and handled to completion
//! by its own task: read one message, process it (including any graph
//! transaction work), write the replies, repeat. The only state
//! shared across connections is the storage boundary, which guards
//! itself; everything transfer-scoped lives in the per-connection
//! session and dies with it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod config;
mod error;
mod export;
mod handler;
mod server;
mod session;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use export::{resolve_export, ExportSet};
pub use server::{serve_stream, SharedStores, SyncServer};
