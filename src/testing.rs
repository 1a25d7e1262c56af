//! # Test harness for effects.
//!
//! [`EffectTester`] is a root [`EffectRunner`] whose dispatcher is an internal
//! channel, so tests can push iterations and read back what effects emitted.
//!
//! Available with the `testing` feature (and always inside this crate's tests).
//!
//! ## Example
//! ```rust
//! # #[cfg(feature = "testing")]
//! # async fn demo() {
//! use futures::StreamExt;
//! use effectvisor::{Definition, EffectFn, EffectTester};
//!
//! let mut tester = EffectTester::<(), u32>::new();
//! let double: Definition<(), u32> = Definition::new("double", |_| {
//!     Ok(EffectFn::arc("double", |input| input.map(|it| it.action * 2).boxed()))
//! });
//!
//! tester.run(&double).await.unwrap();
//! tester.send_action(21);
//! assert_eq!(tester.next_output().await, Some(42));
//! # }
//! ```

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::mpsc, time};

use crate::{EffectRunner, Injector, Iteration, RunnerConfig};

/// How long [`EffectTester::next_output`] waits.
const OUTPUT_WAIT: Duration = Duration::from_secs(1);

/// Root runner wired to a channel the test can read.
pub struct EffectTester<S, A> {
    runner: Arc<EffectRunner<S, A>>,
    output: mpsc::UnboundedReceiver<A>,
    last: Option<A>,
}

impl<S, A> EffectTester<S, A>
where
    S: Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    /// Tester with an empty [`Injector`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self::with_injector(Injector::new())
    }

    /// Tester resolving definitions through `injector`.
    pub fn with_injector(injector: Injector) -> Self {
        let (tx, output) = mpsc::unbounded_channel();
        let cfg = RunnerConfig {
            grace: Duration::from_millis(100),
            ..RunnerConfig::default()
        };
        let runner = EffectRunner::builder(tx)
            .with_config(cfg)
            .with_resolver(injector)
            .build_root();
        Self {
            runner,
            output,
            last: None,
        }
    }

    /// The underlying root runner (for child scopes, events, etc.).
    pub fn runner(&self) -> &Arc<EffectRunner<S, A>> {
        &self.runner
    }

    /// Publishes `(state, action)`; returns how many effects accepted it.
    pub fn send(&self, state: S, action: A) -> usize {
        self.runner.next(Iteration::new(state, action))
    }

    /// Publishes `action` with a default state.
    pub fn send_action(&self, action: A) -> usize
    where
        S: Default,
    {
        self.send(S::default(), action)
    }

    /// Publishes `state` with a default action.
    pub fn send_state(&self, state: S) -> usize
    where
        A: Default,
    {
        self.send(state, A::default())
    }

    /// Waits (bounded) for the next dispatched action.
    pub async fn next_output(&mut self) -> Option<A> {
        let action = time::timeout(OUTPUT_WAIT, self.output.recv()).await.ok().flatten()?;
        self.last = Some(action.clone());
        Some(action)
    }

    /// Returns an already dispatched action, without waiting.
    pub fn try_output(&mut self) -> Option<A> {
        let action = self.output.try_recv().ok()?;
        self.last = Some(action.clone());
        Some(action)
    }

    /// True if nothing is dispatched within `wait`.
    pub async fn is_quiet_for(&mut self, wait: Duration) -> bool {
        match time::timeout(wait, self.output.recv()).await {
            Ok(Some(action)) => {
                self.last = Some(action);
                false
            }
            Ok(None) | Err(_) => true,
        }
    }

    /// Everything dispatched so far.
    pub fn drain(&mut self) -> Vec<A> {
        let mut out = Vec::new();
        while let Some(action) = self.try_output() {
            out.push(action);
        }
        out
    }

    /// Last action read through this tester.
    pub fn last(&self) -> Option<&A> {
        self.last.as_ref()
    }
}

impl<S, A> Deref for EffectTester<S, A> {
    type Target = EffectRunner<S, A>;

    fn deref(&self) -> &Self::Target {
        &self.runner
    }
}
