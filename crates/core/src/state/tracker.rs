//! The run state tracker: a circular, durable cursor over the product list.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::products::{ProductRecord, ProductSource};

use super::{RunState, RunStateStore, StateError};

/// A product together with its position in the source list.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub index: usize,
    pub product: ProductRecord,
}

/// Products selected for one run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub items: Vec<BatchItem>,
    /// Length of the product list the batch was drawn from.
    pub list_len: usize,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

struct TrackerState {
    current: RunState,
    list_len: usize,
}

/// Owns the progress pointer. All reads and writes of the pointer go through
/// this type; `commit` is serialized by an internal lock held only for the
/// read-modify-persist sequence.
pub struct RunStateTracker {
    store: Arc<dyn RunStateStore>,
    products: Arc<dyn ProductSource>,
    state: Mutex<TrackerState>,
}

impl RunStateTracker {
    /// Load the persisted pointer and build a tracker over `products`.
    pub fn open(
        store: Arc<dyn RunStateStore>,
        products: Arc<dyn ProductSource>,
    ) -> Result<Self, StateError> {
        let current = store.load()?;
        info!("Run state loaded at index {}", current.current_index);

        Ok(Self {
            store,
            products,
            state: Mutex::new(TrackerState {
                current,
                list_len: 0,
            }),
        })
    }

    /// The product source this tracker walks.
    pub fn products(&self) -> &Arc<dyn ProductSource> {
        &self.products
    }

    /// Current committed state.
    pub async fn snapshot(&self) -> RunState {
        self.state.lock().await.current.clone()
    }

    /// Return up to `n` products starting at the current index, wrapping
    /// around the end of the list. Does not move the pointer.
    pub async fn next_batch(&self, n: usize) -> Result<Batch, StateError> {
        let products = self.products.list().await?;
        let list_len = products.len();

        let start = {
            let mut state = self.state.lock().await;
            state.list_len = list_len;
            if list_len == 0 {
                0
            } else {
                state.current.current_index % list_len
            }
        };

        if list_len == 0 {
            debug!("Product list is empty, nothing to process");
            return Ok(Batch::default());
        }

        let take = n.min(list_len);
        let items = (0..take)
            .map(|offset| {
                let index = (start + offset) % list_len;
                BatchItem {
                    index,
                    product: products[index].clone(),
                }
            })
            .collect();

        Ok(Batch { items, list_len })
    }

    /// Advance the pointer by `count` (modulo the list length last seen by
    /// `next_batch`) and persist it. On persistence failure the in-memory
    /// pointer keeps its previous value.
    pub async fn commit(&self, count: usize) -> Result<RunState, StateError> {
        let mut state = self.state.lock().await;

        if state.list_len == 0 || count == 0 {
            return Ok(state.current.clone());
        }

        let next = RunState {
            current_index: (state.current.current_index + count) % state.list_len,
            last_run_timestamp: Some(Utc::now()),
        };

        self.persist(&next).await?;
        debug!(
            "Run state advanced {} -> {}",
            state.current.current_index, next.current_index
        );
        state.current = next.clone();

        Ok(next)
    }

    /// Rewind the pointer to the start of the list.
    pub async fn reset(&self) -> Result<RunState, StateError> {
        let mut state = self.state.lock().await;
        let next = RunState {
            current_index: 0,
            last_run_timestamp: state.current.last_run_timestamp,
        };
        self.persist(&next).await?;
        state.current = next.clone();
        Ok(next)
    }

    /// Run the store's blocking write on the blocking pool.
    async fn persist(&self, next: &RunState) -> Result<(), StateError> {
        let store = Arc::clone(&self.store);
        let next = next.clone();
        tokio::task::spawn_blocking(move || store.save(&next))
            .await
            .map_err(|e| StateError::Persistence(e.to_string()))?
    }
}
