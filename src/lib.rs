//! # effectvisor
//!
//! **Effectvisor** is a lifecycle registry for long-running store effects.
//!
//! A host store publishes every reduced `(state, action)` pair; effects are
//! stream transformers that consume those pairs and emit new actions, which
//! are dispatched back to the store. The runner decides which effects are
//! connected at any moment: it resolves each effect definition once, lets
//! callers pause and resume it without losing the instance, and forgets it
//! on stop. Nested scopes forward every call to the root, so a whole
//! hierarchy shares one set of running effects.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  host store ── reduce ──► Middleware::process(state, action)
//!                                   │ next(Iteration)
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EffectRunner (root scope)                                        │
//! │  - ResolverCache   (definition → resolved effect)                 │
//! │  - Registry        (resolved effect → live subscription)          │
//! │  - IterationStream (bounded input queue per running effect)       │
//! │  - Bus             (lifecycle / delivery events)                  │
//! └──────┬──────────────────┬──────────────────┬───────────────▲──────┘
//!        ▼                  ▼                  ▼               │ run / pause / stop
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │ (forwarded)
//!     │   worker     │   │   worker     │   │   worker     │  child scopes
//!     │ effect A out │   │ effect B out │   │ effect C out │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!              Schedule (Immediate | Deferred | Spawned)
//!                               ▼
//!                      Dispatch ──► host store
//!
//! Bus ──► subscriber_listener ──► SubscriberSet ──► LogWriter / custom subscribers
//! ```
//!
//! ### Lifecycle
//! ```text
//!               run (resolve once)            pause
//! Unresolved ───────────────────► Running ───────────► Paused
//!     ▲                             │  ▲                 │
//!     │            stop             │  └──── run ────────┘
//!     └─────────────────────────────┘      (no resolve)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Effects**       | Stream transformers from iterations to actions.              | [`Effect`], [`EffectFn`], [`EffectRef`]    |
//! | **Definitions**   | Identity-compared recipes, resolved through a resolver.      | [`Definition`], [`Resolve`], [`Injector`]  |
//! | **Lifecycle**     | run / pause / stop / next over a scope hierarchy.            | [`EffectRunner`], [`EffectState`]          |
//! | **Output**        | Where and when emitted actions are dispatched.               | [`Dispatch`], [`Schedule`]                 |
//! | **Subscriber API**| Hook into lifecycle and delivery events.                     | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for rejected calls and shutdown.                | [`LifecycleError`], [`RuntimeError`]       |
//! | **Configuration** | Queue sizes and shutdown grace.                              | [`RunnerConfig`], [`RunnerBuilder`]        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//! - `testing`: exports [`EffectTester`], a runner wired to a readable output channel.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use futures::{future, StreamExt};
//! use tokio::sync::mpsc;
//! use effectvisor::{Definition, EffectFn, EffectRunner, Middleware};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Action { Watch, Next }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn effectvisor::Subscribe>> = vec![Arc::new(effectvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn effectvisor::Subscribe>> = Vec::new();
//!
//!     let (tx, mut dispatched) = mpsc::unbounded_channel::<Action>();
//!     let runner = EffectRunner::<u32, Action>::builder(tx)
//!         .with_subscribers(subs)
//!         .build()
//!         .await?;
//!
//!     let watcher: Definition<u32, Action> = Definition::new("watcher", |_| {
//!         Ok(EffectFn::arc("watcher", |input| {
//!             input
//!                 .filter(|it| future::ready(it.action == Action::Watch))
//!                 .map(|_| Action::Next)
//!                 .boxed()
//!         }))
//!     });
//!     runner.run(&watcher).await?;
//!
//!     // The store's reduce loop feeds the middleware.
//!     let middleware = Middleware::new(Arc::clone(&runner));
//!     let state = middleware.process(1, Action::Watch);
//!     assert_eq!(state, 1);
//!     assert_eq!(dispatched.recv().await, Some(Action::Next));
//!
//!     runner.stop(&watcher).await?;
//!     Ok(())
//! }
//! ```

mod core;
mod effects;
mod error;
mod events;
mod middleware;
mod output;
mod stream;
mod subscribers;
#[cfg(any(test, feature = "testing"))]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{EffectRunner, EffectState, RunnerBuilder, RunnerConfig};
pub use effects::{
    Actions, Definition, DefinitionId, Effect, EffectFn, EffectRef, Injector, Iteration, Iterations,
    Resolve,
};
pub use error::{LifecycleError, ResolveError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use middleware::Middleware;
pub use output::{Deferred, Dispatch, DispatchFn, Immediate, Schedule, Spawned};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

#[cfg(any(test, feature = "testing"))]
pub use testing::EffectTester;
