use ringlog_store::{CappedStore, CharStream, ThreadScheduler};
use std::io::Read;
use std::time::Duration;

const OVERWRITTEN_RESPONSE: &[u8] = b"[overwritten]";

fn scratch_path(name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "ringlog_scenarios_{name}_{:?}",
        std::thread::current().id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}

/// Deterministic xorshift64 stream, high-entropy enough that zlib cannot
/// meaningfully shrink it.
fn pseudo_random_bytes(len: usize) -> Vec<u8> {
    let mut state: u64 = 0x2545F4914F6CDD1D;
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        out.extend_from_slice(&state.to_le_bytes());
    }
    out.truncate(len);
    out
}

fn read_all(store: &CappedStore, id: u64) -> Vec<u8> {
    let mut stream = store.read(id, OVERWRITTEN_RESPONSE).unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    out
}

/// S1: a ring far larger than any single write behaves like a plain append
/// log — nothing expires.
#[test]
fn s1_tiny_ring_no_wrap() {
    let path = scratch_path("s1");
    let store = CappedStore::open(&path, 64, Duration::from_secs(3600), &scheduler()).unwrap();

    let id_a = store.write(b"alpha").unwrap();
    let id_b = store.write(b"beta").unwrap();
    assert_ne!(id_a, -1);
    assert_ne!(id_b, -1);

    assert_eq!(read_all(&store, id_a as u64), b"alpha");
    assert_eq!(read_all(&store, id_b as u64), b"beta");

    store.close();
    let _ = std::fs::remove_file(&path);
}

/// S2: writes that exceed capacity wrap, and the oldest block expires,
/// yielding exactly the caller-supplied overwritten-response bytes.
#[test]
fn s2_wrap_expires_oldest() {
    let path = scratch_path("s2");
    let store = CappedStore::open(&path, 1, Duration::from_secs(3600), &scheduler()).unwrap();

    let first_id = store.write(&vec![b'a'; 400]).unwrap();
    assert_ne!(first_id, -1);

    // Push enough additional data through the 1KB ring that the first block
    // falls outside the live window.
    for _ in 0..10 {
        store.write(&vec![b'b'; 400]).unwrap();
    }

    assert!(store.is_expired(first_id as u64));
    assert_eq!(read_all(&store, first_id as u64), OVERWRITTEN_RESPONSE);

    store.close();
    let _ = std::fs::remove_file(&path);
}

/// S3: a block's payload straddles the physical end-of-file wrap boundary
/// and still round-trips byte for byte.
#[test]
fn s3_block_straddles_wrap_boundary() {
    let path = scratch_path("s3");
    let store = CappedStore::open(&path, 1, Duration::from_secs(3600), &scheduler()).unwrap();

    // Fill most of the ring so the next write's payload wraps.
    let filler_id = store.write(&vec![b'x'; 900]).unwrap();
    assert_ne!(filler_id, -1);

    let straddling_payload: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
    let id = store.write(&straddling_payload).unwrap();
    assert_ne!(id, -1);

    assert_eq!(read_all(&store, id as u64), straddling_payload);

    store.close();
    let _ = std::fs::remove_file(&path);
}

/// S4: growing the ring keeps existing live ids readable.
#[test]
fn s4_resize_grow_keeps_live_ids() {
    let path = scratch_path("s4");
    let store = CappedStore::open(&path, 1, Duration::from_secs(3600), &scheduler()).unwrap();

    let id = store.write(b"still here after growth").unwrap();
    store.resize(8).unwrap();
    assert_eq!(store.capacity_kb(), 8);

    assert!(!store.is_expired(id as u64));
    assert_eq!(read_all(&store, id as u64), b"still here after growth");

    store.close();
    let _ = std::fs::remove_file(&path);
}

/// S5: shrinking the ring below a block's distance from the write head
/// expires it instead of corrupting the file.
#[test]
fn s5_resize_shrink_expires_far_blocks() {
    let path = scratch_path("s5");
    let store = CappedStore::open(&path, 8, Duration::from_secs(3600), &scheduler()).unwrap();

    let old_id = store.write(&vec![b'a'; 100]).unwrap();
    store.write(&vec![b'b'; 6000]).unwrap();

    store.resize(1).unwrap();

    assert!(store.is_expired(old_id as u64));
    assert_eq!(read_all(&store, old_id as u64), OVERWRITTEN_RESPONSE);

    store.close();
    let _ = std::fs::remove_file(&path);
}

/// S6: an explicit close racing the process-shutdown hook must not panic or
/// double-run any teardown work.
#[test]
fn s6_double_close_is_idempotent() {
    let path = scratch_path("s6");
    let store = CappedStore::open(&path, 4, Duration::from_secs(3600), &scheduler()).unwrap();
    store.write(b"payload").unwrap();

    store.close();
    store.close(); // must not panic

    let _ = std::fs::remove_file(&path);
}

/// Per the store's documented sentinel semantics, a write after close
/// reports "nothing was written" the same way an oversized write does,
/// rather than surfacing as an error.
#[test]
fn write_after_close_returns_sentinel() {
    let path = scratch_path("write_after_close");
    let store = CappedStore::open(&path, 4, Duration::from_secs(3600), &scheduler()).unwrap();
    store.close();
    assert_eq!(store.write(b"nope").unwrap(), -1);
    let _ = std::fs::remove_file(&path);
}

/// Property 6: a block that rolls over while a `BlockReader` is mid-stream
/// must surface `RolledOverMidRead` on the next underlying read rather than
/// returning stale or truncated bytes. The payload is sized past the
/// decompressor's internal buffer so the first `read()` call only consumes
/// part of the compressed block, leaving a second underlying read (and so a
/// second liveness check) to happen after the intervening writes expire it.
#[test]
fn rolled_over_mid_read_errors() {
    let path = scratch_path("rollover");
    let store = CappedStore::open(&path, 64, Duration::from_secs(3600), &scheduler()).unwrap();

    let payload = pseudo_random_bytes(20_000);
    let id = store.write(&payload).unwrap();
    assert_ne!(id, -1);

    let mut stream = store.read(id as u64, OVERWRITTEN_RESPONSE).unwrap();

    let mut first = vec![0u8; payload.len()];
    let n = stream.read(&mut first).unwrap();
    assert!(n > 0 && n < payload.len(), "expected a short first read, got {n}");

    // Push enough additional data through the ring that `id` falls outside
    // the live window.
    store.write(&pseudo_random_bytes(50_000)).unwrap();
    assert!(store.is_expired(id as u64));

    let mut rest = vec![0u8; payload.len()];
    let err = stream.read(&mut rest).unwrap_err();
    assert!(err.to_string().contains("overwritten"), "{err}");

    store.close();
    let _ = std::fs::remove_file(&path);
}
