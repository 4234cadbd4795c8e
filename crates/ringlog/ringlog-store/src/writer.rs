use ringlog_io::FileRing;
use ringlog_io::codec;
use std::io;

pub const LENGTH_PREFIX_LEN: u64 = 8;

/// Compress `payload`, frame it with its length prefix, and append it to
/// `ring`. Returns `None` (the store's `-1` sentinel) if the framed block can
/// never fit inside the ring's capacity, rather than attempting a write that
/// would corrupt older live blocks.
pub fn write_block(ring: &mut FileRing, payload: &[u8]) -> io::Result<Option<u64>> {
    let compressed = codec::compress(payload)?;
    let framed_len = LENGTH_PREFIX_LEN + compressed.len() as u64;
    if framed_len > ring.capacity() {
        return Ok(None);
    }

    let mut framed = Vec::with_capacity(framed_len as usize);
    framed.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
    framed.extend_from_slice(&compressed);

    let id = ring.append(&framed)?;
    Ok(Some(id))
}
