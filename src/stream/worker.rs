//! # Drive one effect's output until cancellation or completion.
//!
//! ```text
//! loop {
//!   select! (biased) {
//!     token.cancelled()  ─► exit (pause/stop/shutdown)
//!     output.next()      ─► Some(action) ─► Outlet::deliver(action)
//!                        ─► None         ─► publish EffectCompleted, exit
//!                        ─► panic        ─► publish EffectPanicked, exit
//!   }
//! }
//! ```
//!
//! ## Rules
//! - Cancellation wins over pending output (biased select), and is re-checked
//!   right before every delivery and before reporting completion.
//! - Exiting the worker drops the output stream, which drops the input queue
//!   receiver; later publishes see the queue as closed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    effects::Actions,
    error::panic_message,
    events::{Bus, Event, EventKind},
    output::Outlet,
};

/// How a worker finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Token cancelled.
    Cancelled,
    /// Output stream ended.
    Completed,
    /// Output stream panicked.
    Panicked,
}

/// Drains `output` into `outlet` until `token` is cancelled or the stream ends.
pub(crate) async fn drive<A: Send + 'static>(
    effect: Arc<str>,
    mut output: Actions<A>,
    token: CancellationToken,
    outlet: Outlet<A>,
    bus: Bus,
) -> WorkerExit {
    tracing::debug!(effect = %effect, "effect worker started");

    let exit = loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break WorkerExit::Cancelled,
            next = AssertUnwindSafe(output.next()).catch_unwind() => next,
        };

        match next {
            Ok(Some(action)) => {
                if token.is_cancelled() {
                    break WorkerExit::Cancelled;
                }
                outlet.deliver(action);
            }
            Ok(None) if token.is_cancelled() => break WorkerExit::Cancelled,
            Ok(None) => {
                bus.publish(Event::new(EventKind::EffectCompleted).with_effect(Arc::clone(&effect)));
                break WorkerExit::Completed;
            }
            Err(panic_err) => {
                bus.publish(
                    Event::new(EventKind::EffectPanicked)
                        .with_effect(Arc::clone(&effect))
                        .with_reason(panic_message(&*panic_err)),
                );
                break WorkerExit::Panicked;
            }
        }
    };

    tracing::debug!(effect = %effect, ?exit, "effect worker exited");
    exit
}
