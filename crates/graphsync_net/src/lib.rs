//! # GraphSync Net
//!
//! Connection state, frame I/O, and session encryption for the
//! GraphSync protocol.
//!
//! This crate provides:
//! - [`Connection`] — the stateful duplex channel both roles speak
//!   through: negotiated cipher, authenticated principal, last
//!   protocol error, progress counter
//! - [`CipherState`] — the per-connection AES-GCM cipher installed by
//!   the handshake
//! - [`derive_session_key`] — the credential-derived key both ends
//!   compute independently; the key itself never crosses the wire
//!
//! Transport framing is a `u32` length prefix followed by the encoded
//! message — sealed once a cipher is installed, plaintext before
//! that. The protocol is strictly half-duplex: exactly one message is
//! in flight per connection at a time.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod connection;
mod error;
mod frame;

pub use cipher::{
    clamp_key_length, derive_session_key, CipherState, SessionKey, NONCE_SIZE, TAG_SIZE,
};
pub use connection::{Connection, DEFAULT_MAX_FRAME};
pub use error::{NetError, NetResult};
