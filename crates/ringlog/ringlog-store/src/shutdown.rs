//! Process-wide registry of store close hooks, so a `CappedStore` flushes its
//! header on process exit even if the embedder never calls `close()`
//! explicitly. A store registers a hook holding only a `Weak` reference to
//! itself at construction, so the registry never keeps a store alive past
//! its last strong owner.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

type Hook = Box<dyn Fn() + Send + Sync>;

static REGISTRY: Lazy<Mutex<HashMap<u64, Hook>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub struct RegistrationHandle(u64);

pub fn register(hook: impl Fn() + Send + Sync + 'static) -> RegistrationHandle {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    REGISTRY.lock().insert(id, Box::new(hook));
    RegistrationHandle(id)
}

pub fn deregister(handle: &RegistrationHandle) {
    REGISTRY.lock().remove(&handle.0);
}

/// Run and drop every still-registered hook. Intended to be wired into the
/// embedding process's own shutdown path; calling it more than once is safe
/// since each hook is idempotent and is removed from the registry before
/// running.
pub fn run_all() {
    let hooks: Vec<Hook> = REGISTRY.lock().drain().map(|(_, hook)| hook).collect();
    for hook in hooks {
        hook();
    }
}
