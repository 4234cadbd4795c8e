//! Low-level file primitive for a capped circular block log.
//!
//! `ring` owns the 20-byte header layout and the wrap-aware raw byte I/O that
//! every higher-level piece (writer, reader, resize) is built from. `codec`
//! wraps that raw I/O in the streaming zlib framing the store needs.

pub mod codec;
pub mod ring;

pub use ring::{FileRing, HEADER_LEN, RingHeader};
