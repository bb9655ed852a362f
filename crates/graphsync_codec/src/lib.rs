//! # GraphSync Codec
//!
//! Wire value codec for the GraphSync protocol.
//!
//! Every protocol message is serialized as a flat sequence of typed
//! values written in a fixed field order that encode and decode must
//! keep in lock-step — there is no self-describing schema on the wire.
//! The value universe is closed:
//!
//! - null
//! - boolean
//! - 32-bit integer
//! - 64-bit integer
//! - UTF-8 text
//! - byte string
//! - string-keyed map of the above (insertion order preserved)
//!
//! Each value is a one-byte kind tag followed by its payload. Integers
//! are big-endian; text and byte strings are `u32` length-prefixed;
//! maps are `u32` entry-count-prefixed. Unlike a canonical encoding,
//! map keys are *not* sorted: property maps must survive a round trip
//! in their original key order.
//!
//! ## Usage
//!
//! ```
//! use graphsync_codec::{Reader, Value, Writer};
//!
//! let mut w = Writer::new();
//! w.put_str("alice");
//! w.put_i32(42);
//! let bytes = w.into_bytes();
//!
//! let mut r = Reader::new(&bytes);
//! assert_eq!(r.get_str().unwrap(), "alice");
//! assert_eq!(r.get_i32().unwrap(), 42);
//! assert!(r.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reader;
mod value;
mod writer;

pub use error::{CodecError, CodecResult};
pub use reader::Reader;
pub use value::Value;
pub use writer::Writer;
