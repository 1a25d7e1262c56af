//! # Effect output: dispatcher and scheduling.
//!
//! ```text
//! effect output ──► Outlet::deliver ──► Schedule::schedule ──► Dispatch::dispatch ──► host store
//! ```

mod dispatch;
mod scheduler;

use std::sync::Arc;

pub use dispatch::{Dispatch, DispatchFn};
pub use scheduler::{Deferred, Immediate, Schedule, Spawned};

/// Dispatcher plus the scheduling policy in front of it.
pub(crate) struct Outlet<A> {
    dispatcher: Arc<dyn Dispatch<A>>,
    scheduler: Arc<dyn Schedule<A>>,
}

impl<A: 'static> Outlet<A> {
    pub(crate) fn new(dispatcher: Arc<dyn Dispatch<A>>, scheduler: Arc<dyn Schedule<A>>) -> Self {
        Self {
            dispatcher,
            scheduler,
        }
    }

    /// Hands one action to the scheduler.
    #[inline]
    pub(crate) fn deliver(&self, action: A) {
        self.scheduler.schedule(action, &self.dispatcher);
    }
}

impl<A> Clone for Outlet<A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}
