//! # Output scheduling strategies.
//!
//! A [`Schedule`] decides on which execution context an effect's output
//! reaches the dispatcher. It is invisible to the lifecycle state machine:
//! pausing an effect stops new output from being scheduled, but actions that
//! were already handed to a deferring scheduler are still dispatched.
//!
//! | Strategy      | Context                         | Ordering per effect |
//! |---------------|---------------------------------|---------------------|
//! | [`Immediate`] | inline in the effect's worker   | preserved           |
//! | [`Deferred`]  | single shared dispatch task     | preserved           |
//! | [`Spawned`]   | one tokio task per action       | not guaranteed      |

use std::sync::Arc;

use tokio::sync::mpsc;

use super::dispatch::Dispatch;

/// Strategy that hands an action to the dispatcher.
pub trait Schedule<A>: Send + Sync + 'static {
    /// Delivers `action` to `dispatcher`, now or later.
    fn schedule(&self, action: A, dispatcher: &Arc<dyn Dispatch<A>>);
}

/// Dispatches synchronously from the effect's worker (default).
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl<A: 'static> Schedule<A> for Immediate {
    fn schedule(&self, action: A, dispatcher: &Arc<dyn Dispatch<A>>) {
        dispatcher.dispatch(action);
    }
}

/// Spawns one task per action.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spawned;

impl<A: Send + 'static> Schedule<A> for Spawned {
    fn schedule(&self, action: A, dispatcher: &Arc<dyn Dispatch<A>>) {
        let dispatcher = Arc::clone(dispatcher);
        tokio::spawn(async move { dispatcher.dispatch(action) });
    }
}

type Job<A> = (A, Arc<dyn Dispatch<A>>);

/// Queues actions for a single background dispatch task.
///
/// The task ends when the last clone of the scheduler is dropped.
pub struct Deferred<A> {
    tx: mpsc::UnboundedSender<Job<A>>,
}

impl<A: Send + 'static> Deferred<A> {
    /// Creates the queue and spawns its dispatch task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job<A>>();
        tokio::spawn(async move {
            while let Some((action, dispatcher)) = rx.recv().await {
                dispatcher.dispatch(action);
            }
        });
        Self { tx }
    }
}

impl<A> Clone for Deferred<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Send + 'static> Schedule<A> for Deferred<A> {
    fn schedule(&self, action: A, dispatcher: &Arc<dyn Dispatch<A>>) {
        if self.tx.send((action, Arc::clone(dispatcher))).is_err() {
            tracing::warn!("deferred dispatch task is gone; action dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (Arc<dyn Dispatch<u8>>, mpsc::UnboundedReceiver<u8>) {
        let (tx, rx) = mpsc::unbounded_channel::<u8>();
        (Arc::new(tx), rx)
    }

    #[test]
    fn immediate_dispatches_inline() {
        let (dispatcher, mut rx) = channel();
        Immediate.schedule(3, &dispatcher);
        assert_eq!(rx.try_recv().ok(), Some(3));
    }

    #[tokio::test]
    async fn deferred_preserves_order() {
        let (dispatcher, mut rx) = channel();
        let scheduler = Deferred::new();
        scheduler.schedule(1, &dispatcher);
        scheduler.schedule(2, &dispatcher);
        assert!(rx.try_recv().is_err());

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn spawned_eventually_dispatches() {
        let (dispatcher, mut rx) = channel();
        Spawned.schedule(9, &dispatcher);
        assert_eq!(rx.recv().await, Some(9));
    }
}
