//! # GraphSync Client
//!
//! The client role of the GraphSync protocol.
//!
//! This crate provides:
//! - [`SyncClient`] — the connection driver: handshake, transaction
//!   bracketing, client-paced bulk pull, acked push, catalog queries
//! - [`FileAssembler`] — chunked-file reassembly into a temporary
//!   file, atomically relocated on completion
//!
//! Bulk transfer is client-paced: the client issues one request per
//! unit of work (one message per node, one per relationship, one per
//! file chunk) and waits for each reply before the next send. The
//! absence of an expected reply is bounded by the configured request
//! timeout.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod assemble;
mod client;
mod config;
mod error;

pub use assemble::FileAssembler;
pub use client::{PullReport, SyncClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
