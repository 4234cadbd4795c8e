//! Store-level assembly of the capped block log: framing, the lazy streaming
//! reader, the coarse-locked front door, and the periodic flush / shutdown
//! machinery an embedder wires a scheduler into.

mod error;
mod reader;
pub mod scheduler;
pub mod shutdown;
mod store;
mod writer;

pub use error::StoreError;
pub use reader::BlockReader;
pub use scheduler::{Clock, PeriodicTask, Scheduler, SystemClock, TaskHandle, ThreadScheduler};
pub use store::{CappedStore, CharStream};
