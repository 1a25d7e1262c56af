//! # Iteration stream: broadcast of `(state, action)` pairs to running effects.
//!
//! ```text
//! publish(iteration)
//!     │ Arc<Iteration>
//!     ├──► [input 1] ──► effect1.connect(..) ──► worker 1 ──► Outlet
//!     ├──► [input 2] ──► effect2.connect(..) ──► worker 2 ──► Outlet
//!     └──► [input N] ──► effectN.connect(..) ──► worker N ──► Outlet
//! ```
//!
//! ## Rules
//! - Inputs are visited in attachment order; each queue is FIFO.
//! - `publish` never blocks: a full queue drops the iteration for that effect
//!   only and publishes `IterationDropped`.
//! - Only inputs attached **before** a publish see it. Nothing is replayed.
//! - A detached input never receives another iteration.

mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use futures::StreamExt;
use parking_lot::RwLock;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    effects::{EffectRef, Iteration, Iterations},
    events::{Bus, Event, EventKind},
    output::Outlet,
};

pub(crate) use worker::WorkerExit;

/// Queue feeding one connected effect.
struct Inlet<S, A> {
    id: u64,
    effect: Arc<str>,
    sender: mpsc::Sender<Arc<Iteration<S, A>>>,
}

struct Inner<S, A> {
    inlets: RwLock<Vec<Inlet<S, A>>>,
    next_id: AtomicU64,
    capacity: usize,
    outlet: Outlet<A>,
    bus: Bus,
}

/// Shared broadcast point of a root runner.
pub(crate) struct IterationStream<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for IterationStream<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> IterationStream<S, A>
where
    S: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Creates an empty stream; `capacity` bounds every effect's input queue.
    pub(crate) fn new(capacity: usize, outlet: Outlet<A>, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner {
                inlets: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
                outlet,
                bus,
            }),
        }
    }

    /// Offers `iteration` to every attached effect.
    ///
    /// Returns the number of input queues that accepted it.
    pub(crate) fn publish(&self, iteration: Iteration<S, A>) -> usize {
        let iteration = Arc::new(iteration);
        let inlets = self.inner.inlets.read();
        let mut accepted = 0;

        for inlet in inlets.iter() {
            match inlet.sender.try_send(Arc::clone(&iteration)) {
                Ok(()) => accepted += 1,
                Err(TrySendError::Full(_)) => {
                    self.inner.bus.publish(
                        Event::new(EventKind::IterationDropped)
                            .with_effect(Arc::clone(&inlet.effect))
                            .with_reason("full"),
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!(effect = %inlet.effect, "effect input closed; iteration skipped");
                }
            }
        }
        accepted
    }

    /// Connects `effect` to a fresh input queue and spawns its worker.
    ///
    /// `Effect::connect` runs synchronously on the caller's task.
    pub(crate) fn attach(&self, effect: EffectRef<S, A>, token: CancellationToken) -> Subscription<S, A> {
        let name: Arc<str> = effect.name().into();
        let (tx, mut rx) = mpsc::channel::<Arc<Iteration<S, A>>>(self.inner.capacity);
        let input: Iterations<S, A> = futures::stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed();
        let output = effect.connect(input);

        let id = self.inner.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner.inlets.write().push(Inlet {
            id,
            effect: Arc::clone(&name),
            sender: tx,
        });

        let join = tokio::spawn(worker::drive(
            Arc::clone(&name),
            output,
            token.clone(),
            self.inner.outlet.clone(),
            self.inner.bus.clone(),
        ));

        Subscription {
            id,
            effect: name,
            token,
            join,
            stream: self.clone(),
        }
    }
}

impl<S, A> IterationStream<S, A> {
    /// Removes an input queue; later publishes skip it.
    pub(crate) fn detach(&self, id: u64) -> bool {
        let mut inlets = self.inner.inlets.write();
        match inlets.iter().position(|inlet| inlet.id == id) {
            Some(pos) => {
                inlets.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drops every input queue.
    pub(crate) fn clear(&self) {
        self.inner.inlets.write().clear();
    }

    /// Number of attached inputs.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.inlets.read().len()
    }
}

/// Live connection of one effect to the stream.
///
/// Dropping it does **not** disconnect; call [`Subscription::cancel`].
pub(crate) struct Subscription<S, A> {
    id: u64,
    effect: Arc<str>,
    token: CancellationToken,
    join: JoinHandle<WorkerExit>,
    stream: IterationStream<S, A>,
}

impl<S, A> Subscription<S, A> {
    /// Effect name.
    pub(crate) fn effect(&self) -> &Arc<str> {
        &self.effect
    }

    /// Cancels the worker, then detaches the input.
    ///
    /// Once this returns, no further iteration reaches the effect. A worker
    /// already past its token check may still hand one action to the outlet;
    /// after the returned handle resolves, nothing more is delivered.
    pub(crate) fn cancel(self) -> (Arc<str>, JoinHandle<WorkerExit>) {
        self.token.cancel();
        self.stream.detach(self.id);
        (self.effect, self.join)
    }
}
