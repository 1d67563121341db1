//! In-memory run state store for testing.

use std::sync::{Mutex, MutexGuard};

use crate::state::{RunState, RunStateStore, StateError};

#[derive(Debug, Default)]
struct Inner {
    initial: RunState,
    saved: Option<RunState>,
    save_count: usize,
    fail_saves: bool,
}

/// Run state store that keeps the record in memory.
///
/// - Starts from a configurable index
/// - Records the last saved state
/// - Can be told to fail saves, simulating a crash before the write lands
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: Mutex<Inner>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the pointer at `index`.
    pub fn with_index(index: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                initial: RunState {
                    current_index: index,
                    last_run_timestamp: None,
                },
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Last successfully saved state, if any.
    pub fn saved(&self) -> Option<RunState> {
        self.lock().saved.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }
}

impl RunStateStore for MemoryStateStore {
    fn load(&self) -> Result<RunState, StateError> {
        let inner = self.lock();
        Ok(inner.saved.clone().unwrap_or_else(|| inner.initial.clone()))
    }

    fn save(&self, state: &RunState) -> Result<(), StateError> {
        let mut inner = self.lock();
        if inner.fail_saves {
            return Err(StateError::Persistence(
                "simulated write failure".to_string(),
            ));
        }
        inner.saved = Some(state.clone());
        inner.save_count += 1;
        Ok(())
    }
}
