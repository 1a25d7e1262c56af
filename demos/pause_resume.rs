//! # Example: pause_resume
//!
//! Pausing keeps the resolved instance; stopping drops it.
//!
//! The effect below owns a counter that lives in the resolved instance. It
//! survives `pause`/`run`, and starts over after `stop`/`run`.
//!
//! ```text
//! run ──► Running ──pause──► Paused ──run──► Running ──stop──► Unresolved ──run──► Running
//!           count 1..            (kept)        count 3..           (dropped)         count 1..
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pause_resume
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use effectvisor::{Definition, EffectFn, EffectRunner, Iteration};
use futures::StreamExt;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut dispatched) = mpsc::unbounded_channel::<String>();
    let runner = EffectRunner::<(), String>::builder(tx).build().await?;

    let counter: Definition<(), String> = Definition::new("counter", |_| {
        println!("[resolver] building counter");
        let seen = Arc::new(AtomicU32::new(0));
        Ok(EffectFn::arc("counter", move |input| {
            let seen = Arc::clone(&seen);
            input
                .map(move |it| format!("{} #{}", it.action, seen.fetch_add(1, Ordering::SeqCst) + 1))
                .boxed()
        }))
    });

    runner.run(&counter).await?;
    for tick in ["a", "b"] {
        runner.next(Iteration::new((), tick.to_string()));
        println!("[store] {:?}", dispatched.recv().await);
    }

    runner.pause(&counter).await?;
    let accepted = runner.next(Iteration::new((), "ignored".to_string()));
    println!("[store] while paused, accepted by {accepted} effects; state={:?}", runner.state(&counter));

    runner.run(&counter).await?;
    runner.next(Iteration::new((), "c".to_string()));
    println!("[store] {:?}", dispatched.recv().await);

    runner.stop(&counter).await?;
    runner.run(&counter).await?;
    runner.next(Iteration::new((), "d".to_string()));
    println!("[store] {:?}", dispatched.recv().await);

    if let Err(err) = runner.run(&counter).await {
        println!("[runner] second run rejected: {err} ({})", err.as_label());
    }
    Ok(())
}
