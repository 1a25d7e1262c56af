//! # Event: what happened to which effect, in which scope
//!
//! Kinds fall into four groups. *Lifecycle* kinds follow `run`, `pause` and
//! `stop`. *Delivery* kinds come from stream workers. *Subscriber* kinds
//! report trouble in a subscriber lane. *Shutdown* kinds bracket
//! [`EffectRunner::shutdown`](crate::EffectRunner::shutdown).
//!
//! `seq` is drawn from one process-wide counter, so sorting by it recovers
//! publication order even after subscribers reorder events.
//!
//! ```rust
//! use effectvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::EffectPaused)
//!     .with_effect("watcher")
//!     .with_definition(7)
//!     .with_reason("manual");
//!
//! assert_eq!(ev.kind, EventKind::EffectPaused);
//! assert_eq!(ev.effect.as_deref(), Some("watcher"));
//! assert_eq!(ev.definition, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What an [`Event`] reports. Each variant lists the fields it fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // --- lifecycle ---
    /// Definition was materialized by the resolver (first `run` or `run` after `stop`).
    ///
    /// Sets:
    /// - `effect`: effect name
    /// - `definition`: definition id
    /// - `scope`: root scope id
    EffectResolved,

    /// Resolver failed; nothing was cached.
    ///
    /// Sets:
    /// - `effect`: definition name
    /// - `definition`: definition id
    /// - `reason`: resolver error message
    ResolveFailed,

    /// Effect was connected to the iteration stream.
    ///
    /// Sets:
    /// - `effect`, `definition`, `scope`
    EffectStarted,

    /// Effect was disconnected; its resolved instance is kept.
    ///
    /// Sets:
    /// - `effect`, `definition`, `scope`
    EffectPaused,

    /// Effect was disconnected and its resolved instance evicted.
    ///
    /// Sets:
    /// - `effect`, `definition`, `scope`
    EffectStopped,

    /// A lifecycle call was rejected (double run, double pause, unknown definition).
    ///
    /// Sets:
    /// - `effect`, `definition`, `scope`
    /// - `reason`: stable error label (e.g. `effect_already_running`)
    LifecycleRejected,

    // --- delivery ---
    /// Effect's output stream ended on its own. The subscription stays registered.
    ///
    /// Sets:
    /// - `effect`
    EffectCompleted,

    /// Effect's output stream panicked; the worker stopped.
    ///
    /// Sets:
    /// - `effect`
    /// - `reason`: panic message
    EffectPanicked,

    /// Iteration could not be queued for an effect (input queue full).
    ///
    /// Sets:
    /// - `effect`
    /// - `reason`: `"full"`
    IterationDropped,

    // --- subscriber lanes ---
    /// `Subscribe::on_event` panicked; the lane keeps running.
    ///
    /// Sets:
    /// - `effect`: subscriber name
    /// - `reason`: panic payload
    SubscriberPanicked,

    /// A lane could not take an event.
    ///
    /// Sets:
    /// - `effect`: subscriber name
    /// - `reason`: `subscriber=<name> reason=<full|closed>`
    SubscriberOverflow,

    // --- shutdown ---
    /// Graceful shutdown of the root runner requested.
    ShutdownRequested,

    /// All effect workers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    ///
    /// Sets:
    /// - `reason`: names of the stuck effects
    GraceExceeded,
}

/// A single published occurrence. Optional fields depend on `kind`.
#[derive(Clone, Debug)]
pub struct Event {
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,
    /// Effect name, or subscriber name for subscriber kinds.
    pub effect: Option<Arc<str>>,
    /// Identity of the definition the event is about.
    pub definition: Option<u64>,
    /// Scope id of the runner that executed the operation.
    pub scope: Option<u64>,
    /// Error label, panic message or drop reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a new event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            effect: None,
            definition: None,
            scope: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_effect(mut self, effect: impl Into<Arc<str>>) -> Self {
        self.effect = Some(effect.into());
        self
    }

    #[inline]
    pub fn with_definition(mut self, id: u64) -> Self {
        self.definition = Some(id);
        self
    }

    /// Attaches the id of the scope that handled the operation.
    #[inline]
    pub fn with_scope(mut self, scope: u64) -> Self {
        self.scope = Some(scope);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// A lane lost an event; `reason` is `"full"` or `"closed"`.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_effect(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_effect(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// Resolved, started, paused or stopped.
    #[inline]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self.kind,
            EventKind::EffectResolved
                | EventKind::EffectStarted
                | EventKind::EffectPaused
                | EventKind::EffectStopped
        )
    }
}
