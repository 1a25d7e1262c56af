//! # SubscriberSet: per-subscriber delivery lanes
//!
//! The root runner owns one [`SubscriberSet`]. Every event that reaches the
//! set is copied into one lane per subscriber; each lane is a bounded queue
//! drained by its own task.
//!
//! ```text
//!                 ┌─► lane "log"     [bounded] ─► task ─► on_event
//! emit(&Event) ───┼─► lane "metrics" [bounded] ─► task ─► on_event
//!                 └─► lane "custom"  [bounded] ─► task ─► on_event
//!                                                   └─ panic ─► SubscriberPanicked
//! ```
//!
//! A lane preserves event order for its subscriber; lanes are not ordered
//! relative to each other. `emit` never waits: a full or closed lane loses
//! the event and a `SubscriberOverflow` is published instead, except when
//! the lost event is itself an overflow report.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    task: JoinHandle<()>,
}

impl Lane {
    fn open(sub: Arc<dyn Subscribe>, bus: Bus) -> Self {
        let name = sub.name();
        let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
        let task = tokio::spawn(drain(sub, rx, bus));
        Self { name, queue, task }
    }

    /// Returns the drop reason when the lane could not take the event.
    fn offer(&self, event: &Arc<Event>) -> Option<&'static str> {
        match self.queue.try_send(Arc::clone(event)) {
            Ok(()) => None,
            Err(TrySendError::Full(_)) => Some("full"),
            Err(TrySendError::Closed(_)) => Some("closed"),
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    tracing::trace!(subscriber = sub.name(), "subscriber lane started");
    while let Some(event) = rx.recv().await {
        let delivered = AssertUnwindSafe(sub.on_event(&event)).catch_unwind().await;
        if let Err(payload) = delivered {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*payload)));
        }
    }
    tracing::trace!(subscriber = sub.name(), "subscriber lane closed");
}

/// Fans events out to a fixed group of [`Subscribe`] implementations.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Opens a lane for each subscriber. Needs a running tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs.into_iter().map(|sub| Lane::open(sub, bus.clone())).collect();
        Self { lanes, bus }
    }

    /// Queues `event` on every lane without waiting.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        let report_losses = !shared.is_subscriber_overflow();

        for lane in &self.lanes {
            match lane.offer(&shared) {
                Some(reason) if report_losses => {
                    self.bus.publish(Event::subscriber_overflow(lane.name, reason));
                }
                _ => {}
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Closes every lane and waits until queued events have been handled.
    pub async fn shutdown(self) {
        let tasks: Vec<_> = self
            .lanes
            .into_iter()
            .map(|Lane { queue, task, .. }| {
                drop(queue);
                task
            })
            .collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::events::EventKind;

    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let bus = Bus::new(16);
        let a = Arc::new(Counter(AtomicUsize::new(0)));
        let b = Arc::new(Counter(AtomicUsize::new(0)));
        let set = SubscriberSet::new(vec![a.clone() as Arc<dyn Subscribe>, b.clone()], bus);
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::EffectStarted));
        set.emit(&Event::new(EventKind::EffectPaused));
        set.shutdown().await;

        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicky) as Arc<dyn Subscribe>], bus);

        set.emit(&Event::new(EventKind::EffectStarted));
        set.shutdown().await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.effect.as_deref(), Some("panicky"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn full_lane_reports_overflow() {
        struct Tiny;

        #[async_trait]
        impl Subscribe for Tiny {
            async fn on_event(&self, _event: &Event) {}

            fn name(&self) -> &'static str {
                "tiny"
            }

            fn queue_capacity(&self) -> usize {
                1
            }
        }

        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Tiny) as Arc<dyn Subscribe>], bus);

        // The lane task has not been polled yet on the current-thread runtime.
        set.emit(&Event::new(EventKind::EffectStarted));
        set.emit(&Event::new(EventKind::EffectPaused));

        let ev = rx.recv().await.expect("overflow event");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.effect.as_deref(), Some("tiny"));
        assert!(ev.reason.as_deref().is_some_and(|r| r.ends_with("reason=full")));
        set.shutdown().await;
    }
}
