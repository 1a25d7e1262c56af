//! # Store middleware: feed every reduced `(state, action)` pair to the runner.
//!
//! ```text
//! dispatch(action) ──► reducer ──► state ──► Middleware::process(state, action)
//!                                                 ├─► runner.next(Iteration)
//!                                                 └─► state (unchanged) ──► store
//! ```
//!
//! The middleware never alters state; it only observes.

use std::sync::Arc;

use crate::{EffectRunner, Iteration};

/// Hooks an [`EffectRunner`] into a host store's reduce loop.
pub struct Middleware<S, A> {
    runner: Arc<EffectRunner<S, A>>,
}

impl<S, A> Middleware<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    pub fn new(runner: Arc<EffectRunner<S, A>>) -> Self {
        Self { runner }
    }

    /// Publishes `(state, action)` and hands `state` back to the store.
    pub fn process(&self, state: S, action: A) -> S {
        let accepted = self.runner.next(Iteration::new(state.clone(), action));
        tracing::trace!(accepted, "iteration published");
        state
    }

    pub fn runner(&self) -> &Arc<EffectRunner<S, A>> {
        &self.runner
    }
}

impl<S, A> Clone for Middleware<S, A> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
        }
    }
}
