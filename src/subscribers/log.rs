//! # LogWriter: structured event logger
//!
//! A minimal subscriber that records incoming [`Event`]s through [`tracing`].
//! Install any `tracing` subscriber (e.g. `tracing-subscriber`'s fmt layer) to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO effectvisor: resolved effect="watcher" definition=3 scope=1
//! INFO effectvisor: started effect="watcher" definition=3 scope=1
//! WARN effectvisor: iteration dropped effect="watcher" reason="full"
//! INFO effectvisor: paused effect="watcher" definition=3 scope=1
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let effect = e.effect.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::EffectResolved => {
                tracing::info!(target: "effectvisor", effect, definition = ?e.definition, scope = ?e.scope, "resolved");
            }
            EventKind::EffectStarted => {
                tracing::info!(target: "effectvisor", effect, definition = ?e.definition, scope = ?e.scope, "started");
            }
            EventKind::EffectPaused => {
                tracing::info!(target: "effectvisor", effect, definition = ?e.definition, scope = ?e.scope, "paused");
            }
            EventKind::EffectStopped => {
                tracing::info!(target: "effectvisor", effect, definition = ?e.definition, scope = ?e.scope, "stopped");
            }
            EventKind::EffectCompleted => {
                tracing::info!(target: "effectvisor", effect, "output completed");
            }
            EventKind::LifecycleRejected => {
                tracing::warn!(target: "effectvisor", effect, reason, "lifecycle call rejected");
            }
            EventKind::ResolveFailed => {
                tracing::error!(target: "effectvisor", effect, reason, "resolve failed");
            }
            EventKind::EffectPanicked => {
                tracing::error!(target: "effectvisor", effect, reason, "effect panicked");
            }
            EventKind::IterationDropped => {
                tracing::warn!(target: "effectvisor", effect, reason, "iteration dropped");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "effectvisor", subscriber = effect, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "effectvisor", subscriber = effect, reason, "subscriber panicked");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "effectvisor", "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "effectvisor", "all effects stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: "effectvisor", stuck = reason, "grace exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
