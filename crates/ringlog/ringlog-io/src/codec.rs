//! Zlib framing for one ring block.
//!
//! A block's compressed bytes are produced in memory before being written to
//! the ring: zlib's DEFLATE stream is self-terminating given the exact byte
//! count, which is the property the ring's length-prefixed block framing
//! actually needs, so there is no requirement to stream the compressor
//! directly against ring-wrapping I/O.

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{self, Read, Write};

/// Compress `payload`, returning the bytes to be written after the block's
/// length prefix.
pub fn compress(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// Wrap a reader of compressed bytes in a streaming zlib decoder.
pub fn decompress_reader<R: Read>(source: R) -> ZlibDecoder<R> {
    ZlibDecoder::new(source)
}
