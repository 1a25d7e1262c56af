//! # Dispatcher: the host's action sink.
//!
//! Every action emitted by a running effect ends up in a [`Dispatch`]
//! implementation, usually the host store's dispatch channel.
//!
//! Provided implementations:
//! - `tokio::sync::mpsc::UnboundedSender<A>` (closed receivers drop the action)
//! - [`DispatchFn`] wrapping any `Fn(A)`

use tokio::sync::mpsc;

/// Sink for actions produced by effects.
pub trait Dispatch<A>: Send + Sync + 'static {
    /// Forwards one action to the host.
    fn dispatch(&self, action: A);
}

impl<A: Send + 'static> Dispatch<A> for mpsc::UnboundedSender<A> {
    fn dispatch(&self, action: A) {
        if self.send(action).is_err() {
            tracing::trace!("dispatch receiver closed; action dropped");
        }
    }
}

/// Closure-backed dispatcher.
///
/// ```
/// use effectvisor::{Dispatch, DispatchFn};
///
/// let sink = DispatchFn::new(|action: u32| assert_eq!(action, 7));
/// sink.dispatch(7);
/// ```
pub struct DispatchFn<F>(F);

impl<F> DispatchFn<F> {
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<A, F> Dispatch<A> for DispatchFn<F>
where
    F: Fn(A) + Send + Sync + 'static,
{
    fn dispatch(&self, action: A) {
        (self.0)(action)
    }
}
