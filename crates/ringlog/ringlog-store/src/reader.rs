use crate::error::StoreError;
use crate::store::StoreState;
use flate2::read::ZlibDecoder;
use parking_lot::Mutex;
use crate::writer::LENGTH_PREFIX_LEN;
use ringlog_io::ring;
use std::io::{self, Read};
use std::sync::Arc;

/// Reads compressed payload bytes for one block directly off the shared read
/// file handle, re-checking liveness under the store lock on every read call
/// so a block that rolls over mid-stream is caught rather than silently
/// returning garbage from a position a later write has since overwritten.
struct BoundedRingSource {
    store: Arc<Mutex<StoreState>>,
    id: u64,
    cursor: u64,
    remaining: u64,
}

impl Read for BoundedRingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let mut guard = self.store.lock();
        if guard.is_overwritten(self.id) {
            return Err(StoreError::RolledOverMidRead(self.id).into());
        }
        let capacity = guard.capacity();
        let want = std::cmp::min(self.remaining, buf.len() as u64) as usize;
        ring::read_ring_bytes(guard.read_file_mut(), self.cursor, capacity, &mut buf[..want])?;
        drop(guard);
        self.cursor += want as u64;
        self.remaining -= want as u64;
        Ok(want)
    }
}

enum ReaderState {
    Unstarted,
    Streaming(ZlibDecoder<BoundedRingSource>),
    Done,
}

/// Lazily-streaming reader for one live block. Constructing one does no disk
/// I/O; the first `read()` call seeks to the block's length prefix and every
/// call after that re-validates the block is still live before touching the
/// file.
pub struct BlockReader {
    store: Arc<Mutex<StoreState>>,
    id: u64,
    state: ReaderState,
}

impl BlockReader {
    pub(crate) fn new(store: Arc<Mutex<StoreState>>, id: u64) -> Self {
        Self {
            store,
            id,
            state: ReaderState::Unstarted,
        }
    }

    fn begin(&mut self) -> io::Result<()> {
        let mut guard = self.store.lock();
        if guard.is_overwritten(self.id) {
            return Err(StoreError::RolledOverMidRead(self.id).into());
        }
        let capacity = guard.capacity();
        let mut len_buf = [0u8; 8];
        ring::read_ring_bytes(guard.read_file_mut(), self.id, capacity, &mut len_buf)?;
        drop(guard);

        let payload_len = u64::from_le_bytes(len_buf);
        let source = BoundedRingSource {
            store: self.store.clone(),
            id: self.id,
            cursor: self.id + LENGTH_PREFIX_LEN,
            remaining: payload_len,
        };
        self.state = ReaderState::Streaming(flate2::read::ZlibDecoder::new(source));
        Ok(())
    }
}

impl Read for BlockReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match &mut self.state {
                ReaderState::Done => return Ok(0),
                ReaderState::Streaming(decoder) => {
                    let n = decoder.read(buf)?;
                    if n == 0 {
                        self.state = ReaderState::Done;
                    }
                    return Ok(n);
                }
                ReaderState::Unstarted => self.begin()?,
            }
        }
    }
}
