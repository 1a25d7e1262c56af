//! # Per-definition serialization of lifecycle calls.
//!
//! `run`/`pause`/`stop` on the same definition are applied one at a time in
//! acquisition order (tokio mutexes are fair). Calls on different
//! definitions do not wait for each other.
//!
//! Entries are created on demand and removed when the last holder or waiter
//! releases them.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::effects::DefinitionId;

#[derive(Default)]
pub(crate) struct DefinitionLocks {
    locks: parking_lot::Mutex<HashMap<DefinitionId, Arc<Mutex<()>>>>,
}

impl DefinitionLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`.
    pub(crate) async fn acquire(&self, id: DefinitionId) -> DefinitionGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(id).or_default())
        };
        let guard = lock.lock_owned().await;
        DefinitionGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }

    fn release(&self, id: DefinitionId) {
        let mut locks = self.locks.lock();
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive access to one definition; released on drop.
pub(crate) struct DefinitionGuard<'a> {
    locks: &'a DefinitionLocks,
    id: DefinitionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DefinitionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(self.id);
    }
}
