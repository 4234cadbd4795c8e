use crate::error::StoreError;
use crate::reader::BlockReader;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::shutdown::{self, RegistrationHandle};
use crate::writer;
use parking_lot::Mutex;
use ringlog_io::FileRing;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// `ringlog-io`'s ring validates a zero size itself (to avoid a divide-by-zero
/// in its own offset arithmetic regardless of caller) and reports it as
/// `io::ErrorKind::InvalidInput`; surface that case through the store's own
/// `InvalidArgument` variant instead of the generic `Io` wrapper.
fn invalid_size_as_argument(err: io::Error) -> io::Error {
    if err.kind() == io::ErrorKind::InvalidInput {
        StoreError::InvalidArgument("size_kb must be non-zero").into()
    } else {
        err
    }
}

/// Everything guarded by the store's single coarse lock: the writer's file
/// handle plus header cache, and the handle readers seek and read through.
/// One lock acquisition protects both sides.
pub(crate) struct StoreState {
    write_ring: FileRing,
    read_file: File,
    closed: bool,
}

impl StoreState {
    fn open(path: &Path, requested_size_kb: u32) -> io::Result<Self> {
        let write_ring =
            FileRing::create_or_open(path, requested_size_kb).map_err(invalid_size_as_argument)?;
        let read_file = OpenOptions::new().read(true).open(path)?;
        Ok(Self {
            write_ring,
            read_file,
            closed: false,
        })
    }

    pub(crate) fn is_overwritten(&self, id: u64) -> bool {
        self.write_ring.is_overwritten(id)
    }

    pub(crate) fn capacity(&self) -> u64 {
        self.write_ring.capacity()
    }

    pub(crate) fn read_file_mut(&mut self) -> &mut File {
        &mut self.read_file
    }
}

/// A stream selected at `read()` time: the liveness check is cheap in-memory
/// arithmetic done eagerly, while the actual decompressing file I/O stays
/// lazy until the first `read()` call on the returned value. Reading an
/// expired id yields exactly the caller-supplied `overwritten_response`
/// bytes rather than an empty stream.
pub enum CharStream {
    Live(BlockReader),
    Overwritten { response: Vec<u8>, pos: usize },
}

impl Read for CharStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            CharStream::Live(reader) => reader.read(buf),
            CharStream::Overwritten { response, pos } => {
                let remaining = &response[*pos..];
                let n = std::cmp::min(remaining.len(), buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n)
            }
        }
    }
}

/// A single fixed-size file behaving as a circular, append-only, compressed
/// block log. Every write and every reader syscall is serialized through one
/// lock (`StoreState`'s mutex); streaming decompression on the read side
/// re-validates liveness on each chunk so a block overwritten mid-read is
/// reported rather than silently corrupted.
pub struct CappedStore {
    inner: Arc<Mutex<StoreState>>,
    path: PathBuf,
    shutdown_handle: Mutex<Option<RegistrationHandle>>,
    scheduler_handle: Mutex<Option<Box<dyn TaskHandle>>>,
}

impl CappedStore {
    /// Open (or create) the store file at `path` and register its shutdown
    /// hook and periodic header flush with the given scheduler.
    pub fn open(
        path: impl AsRef<Path>,
        requested_size_kb: u32,
        flush_interval: Duration,
        scheduler: &dyn Scheduler,
    ) -> io::Result<Arc<Self>> {
        let path = path.as_ref().to_path_buf();
        let state = StoreState::open(&path, requested_size_kb)?;
        let inner = Arc::new(Mutex::new(state));

        let store = Arc::new(Self {
            inner,
            path,
            shutdown_handle: Mutex::new(None),
            scheduler_handle: Mutex::new(None),
        });

        let weak_for_shutdown = Arc::downgrade(&store);
        let shutdown_handle = shutdown::register(move || {
            if let Some(store) = weak_for_shutdown.upgrade() {
                store.close();
            }
        });
        *store.shutdown_handle.lock() = Some(shutdown_handle);

        let weak_for_flush = Arc::downgrade(&store);
        let task_handle = scheduler.schedule_periodic(
            flush_interval,
            Box::new(move || {
                if let Some(store) = weak_for_flush.upgrade() {
                    let _ = store.flush_header();
                }
            }),
        );
        *store.scheduler_handle.lock() = Some(task_handle);

        Ok(store)
    }

    /// Compress and append `payload`. Returns the block id on success, or
    /// `-1` if the block can never fit inside the ring's capacity, or if the
    /// store is closed — both are the documented sentinel for "nothing was
    /// written," never an error.
    pub fn write(&self, payload: &[u8]) -> io::Result<i64> {
        let mut guard = self.inner.lock();
        if guard.closed {
            return Ok(-1);
        }
        match writer::write_block(&mut guard.write_ring, payload)? {
            Some(id) => Ok(id as i64),
            None => Ok(-1),
        }
    }

    /// Construct a stream for the block written at `id`. The liveness check
    /// happens here, under the lock; decompressing file I/O is deferred to
    /// the first `read()` call on the returned stream. If `id` has already
    /// been overwritten, the returned stream yields exactly
    /// `overwritten_response`.
    pub fn read(&self, id: u64, overwritten_response: &[u8]) -> io::Result<CharStream> {
        let guard = self.inner.lock();
        if guard.closed {
            return Err(StoreError::Closed.into());
        }
        if guard.is_overwritten(id) {
            return Ok(CharStream::Overwritten {
                response: overwritten_response.to_vec(),
                pos: 0,
            });
        }
        Ok(CharStream::Live(BlockReader::new(self.inner.clone(), id)))
    }

    /// Whether `id` has fallen outside the live window, without performing a
    /// read.
    pub fn is_expired(&self, id: u64) -> bool {
        self.inner.lock().is_overwritten(id)
    }

    pub fn current_length(&self) -> u64 {
        self.inner.lock().write_ring.current_length()
    }

    pub fn capacity_kb(&self) -> u32 {
        self.inner.lock().write_ring.size_kb()
    }

    pub fn smallest_live_id(&self) -> u64 {
        self.inner.lock().write_ring.smallest_live_id()
    }

    /// Grow or shrink the backing file in place.
    pub fn resize(&self, new_size_kb: u32) -> io::Result<()> {
        let mut guard = self.inner.lock();
        if guard.closed {
            return Err(StoreError::Closed.into());
        }
        guard
            .write_ring
            .resize(new_size_kb)
            .map_err(invalid_size_as_argument)?;
        // The read handle's position is irrelevant (every read reseeks), but
        // a resize changes the file's length, so reopen to avoid an fd whose
        // cached metadata predates the truncate/extend.
        guard.read_file = OpenOptions::new().read(true).open(&self.path)?;
        Ok(())
    }

    pub(crate) fn flush_header(&self) -> io::Result<()> {
        let mut guard = self.inner.lock();
        if guard.closed {
            return Ok(());
        }
        guard.write_ring.persist_header()
    }

    /// Flush the header and cancel the scheduler/shutdown hooks. Safe to
    /// call more than once — an explicit close racing the process-exit hook
    /// is a named scenario, not a bug.
    pub fn close(&self) {
        {
            let mut guard = self.inner.lock();
            if guard.closed {
                return;
            }
            guard.closed = true;
            if let Err(err) = guard.write_ring.persist_header() {
                tracing::warn!(error = %err, "failed to flush ringlog header on close");
            }
        }
        if let Some(handle) = self.scheduler_handle.lock().take() {
            handle.cancel();
        }
        if let Some(handle) = self.shutdown_handle.lock().take() {
            shutdown::deregister(&handle);
        }
    }
}
