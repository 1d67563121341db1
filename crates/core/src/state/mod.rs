//! Run state tracking.
//!
//! A single durable pointer into the ordered product list. The pointer only
//! moves after a product has been fully processed, and it is persisted
//! before the new value becomes visible in memory.

mod store;
mod tracker;
mod types;

pub use store::{JsonFileStateStore, RunStateStore};
pub(crate) use store::write_atomically;
pub use tracker::{Batch, BatchItem, RunStateTracker};
pub use types::{RunState, StateError};
