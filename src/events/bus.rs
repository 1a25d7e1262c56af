//! # Bus: lifecycle event broadcast
//!
//! Every scope of a runner tree publishes into the root's [`Bus`]. Stream
//! workers and subscriber lanes publish into it too. The root drains it with
//! a single listener that hands events to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! EffectRunner (any scope) ─┐
//! IterationStream          ─┼─► Bus (tokio broadcast ring) ─► listener ─► SubscriberSet
//! stream / lane workers    ─┘
//! ```
//!
//! Publishing never waits. With no receiver the event is discarded; a
//! receiver that falls more than `capacity` events behind gets
//! `RecvError::Lagged(n)` and resumes at the oldest retained event.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the event broadcast channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Ring size is shared by all receivers; zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        if self.tx.send(ev).is_err() {
            tracing::trace!("event published with no receivers");
        }
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn receiver_sees_only_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::EffectStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::EffectPaused));

        let ev = rx.try_recv().expect("event after subscribe");
        assert_eq!(ev.kind, EventKind::EffectPaused);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn slow_receiver_lags() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(Event::new(EventKind::EffectStarted));
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
    }
}
