//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for effect lifecycle metrics.
//! - Wire the subscriber into [`RunnerBuilder::with_subscribers`].
//!
//! ## Flow
//! ```text
//! run / pause / stop / next
//!     ├─► Bus.publish(EffectResolved / EffectStarted / EffectPaused / ...)
//!     ├─► workers publish(EffectCompleted / EffectPanicked)
//!     └─► subscriber_listener (in root runner)
//!           └─► SubscriberSet.emit() ──► LifecycleStats.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use effectvisor::{Definition, EffectFn, EffectRunner, Event, EventKind, Iteration, Subscribe};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Counts lifecycle events and prints everything else.
#[derive(Default)]
struct LifecycleStats {
    counts: Mutex<Vec<(EventKind, usize)>>,
}

impl LifecycleStats {
    fn bump(&self, kind: EventKind) {
        let mut counts = self.counts.lock();
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }
}

#[async_trait]
impl Subscribe for LifecycleStats {
    async fn on_event(&self, ev: &Event) {
        if ev.is_lifecycle() {
            self.bump(ev.kind);
            return;
        }
        println!(
            "[sub] {:?}: effect={} reason={}",
            ev.kind,
            ev.effect.as_deref().unwrap_or("<none>"),
            ev.reason.as_deref().unwrap_or("<none>")
        );
    }

    fn name(&self) -> &'static str {
        "lifecycle-stats"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stats = Arc::new(LifecycleStats::default());
    let (tx, _dispatched) = mpsc::unbounded_channel::<u8>();
    let runner = EffectRunner::<(), u8>::builder(tx)
        .with_subscribers(vec![stats.clone() as Arc<dyn Subscribe>])
        .build()
        .await?;

    let once: Definition<(), u8> = Definition::new("once", |_| {
        Ok(EffectFn::arc("once", |input| input.take(1).map(|it| it.action).boxed()))
    });

    runner.run(&once).await?;
    runner.next(Iteration::new((), 1));
    tokio::time::sleep(Duration::from_millis(20)).await;

    runner.pause(&once).await?;
    let _ = runner.pause(&once).await; // rejected: already paused
    runner.run(&once).await?;
    runner.stop(&once).await?;

    tokio::time::sleep(Duration::from_millis(50)).await;
    for (kind, n) in stats.counts.lock().iter() {
        println!("[stats] {kind:?} x{n}");
    }
    Ok(())
}
