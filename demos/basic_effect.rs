//! # Example: basic_effect
//!
//! One effect, one store, events logged through `tracing`.
//!
//! Shows how to:
//! - Define an effect with [`Definition`] + [`EffectFn`].
//! - Build a root [`EffectRunner`] with the built-in [`LogWriter`].
//! - Feed iterations through [`Middleware`] and read dispatched actions.
//!
//! ## Flow
//! ```text
//! store.dispatch(Watch) ──► Middleware::process ──► runner.next(Iteration)
//!                                                       └─► watcher ──► Next ──► store
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example basic_effect --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use effectvisor::{Definition, EffectFn, EffectRunner, LogWriter, Middleware, Subscribe};
use futures::{StreamExt, future};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq)]
enum Action {
    Watch,
    Next,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (tx, mut dispatched) = mpsc::unbounded_channel::<Action>();
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let runner = EffectRunner::<u64, Action>::builder(tx)
        .with_subscribers(subs)
        .build()
        .await?;

    let watcher: Definition<u64, Action> = Definition::new("watcher", |_| {
        Ok(EffectFn::arc("watcher", |input| {
            input
                .filter(|it| future::ready(it.action == Action::Watch))
                .map(|_| Action::Next)
                .boxed()
        }))
    });
    runner.run(&watcher).await?;

    let middleware = Middleware::new(Arc::clone(&runner));
    let mut counter = 0u64;
    for action in [Action::Watch, Action::Next, Action::Watch] {
        counter += 1;
        counter = middleware.process(counter, action);
    }

    for _ in 0..2 {
        if let Some(action) = dispatched.recv().await {
            println!("[store] dispatched {action:?}");
        }
    }

    runner.stop(&watcher).await?;
    // Let the log subscriber drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
