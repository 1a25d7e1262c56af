//! # EffectRunner: lifecycle orchestration over a scope hierarchy.
//!
//! The [`EffectRunner`] turns `run`/`pause`/`stop` calls into changes of two
//! tables owned by the **root** scope, and feeds host iterations to every
//! connected effect.
//!
//! ## Architecture
//! ```text
//! child scope ──► parent scope ──► ... ──► root scope
//!   (resolver)      (resolver)              ├─ ResolverCache   definition → effect
//!                                           ├─ Registry        effect → subscription
//!                                           ├─ DefinitionLocks per-definition ordering
//!                                           ├─ IterationStream broadcast + workers
//!                                           └─ Bus             lifecycle events
//!
//! run(def)   : lock(def) → cache.resolve(def, caller's resolver) → registry.connect
//! pause(def) : lock(def) → cache.get(def)                         → registry.disconnect
//! stop(def)  : lock(def) → pause steps                            → cache.evict
//! next(it)   : stream.publish(it)
//! ```
//!
//! ## Rules
//! - Every call made on a child scope is executed by the root; only the
//!   resolver of the scope the call was made on is used.
//! - A definition is resolved at most once between two `stop`s; `pause` keeps
//!   the instance, so a later `run` reconnects it without resolving.
//! - A rejected call changes nothing and is reported as `LifecycleRejected`
//!   (or `ResolveFailed` for resolver errors).
//! - Dropping the root cancels every worker and closes every input.
//!
//! ## Example
//! ```rust
//! use futures::{future, StreamExt};
//! use tokio::sync::mpsc;
//! use effectvisor::{Definition, EffectFn, EffectRunner, EffectState, Iteration};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
//!     let runner = EffectRunner::<u32, &'static str>::builder(tx).build().await?;
//!
//!     let watcher: Definition<u32, &'static str> = Definition::new("watcher", |_| {
//!         Ok(EffectFn::arc("watcher", |input| {
//!             input
//!                 .filter(|it| future::ready(it.action == "Watch"))
//!                 .map(|_| "Next")
//!                 .boxed()
//!         }))
//!     });
//!
//!     runner.run(&watcher).await?;
//!     assert_eq!(runner.state(&watcher), EffectState::Running);
//!
//!     runner.next(Iteration::new(1, "Watch"));
//!     assert_eq!(rx.recv().await, Some("Next"));
//!
//!     runner.pause(&watcher).await?;
//!     assert_eq!(runner.next(Iteration::new(2, "Watch")), 0);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    effects::{Definition, EffectRef, Iteration, Resolve},
    error::{LifecycleError, RuntimeError},
    events::{Bus, Event, EventKind},
    output::Dispatch,
    stream::{IterationStream, WorkerExit},
};

use super::{
    builder::RunnerBuilder, cache::ResolverCache, config::RunnerConfig, locks::DefinitionLocks,
    registry::Registry,
};

/// Global counter for scope ids.
static SCOPE_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_scope_id() -> u64 {
    SCOPE_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Lifecycle state of a definition as seen by a runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectState {
    /// Never run, or stopped since.
    Unresolved,
    /// Resolved and kept, but not receiving iterations.
    Paused,
    /// Connected to the iteration stream.
    Running,
}

/// Tables and plumbing owned by the root scope.
pub(crate) struct Root<S, A> {
    id: u64,
    cfg: RunnerConfig,
    bus: Bus,
    stream: IterationStream<S, A>,
    cache: ResolverCache<S, A>,
    registry: Registry<S, A>,
    locks: DefinitionLocks,
    runtime_token: CancellationToken,
}

impl<S, A> Root<S, A>
where
    S: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    pub(crate) fn new(
        cfg: RunnerConfig,
        bus: Bus,
        stream: IterationStream<S, A>,
        runtime_token: CancellationToken,
    ) -> Self {
        let registry = Registry::new(stream.clone(), runtime_token.clone());
        Self {
            id: next_scope_id(),
            cfg,
            bus,
            stream,
            cache: ResolverCache::new(),
            registry,
            locks: DefinitionLocks::new(),
            runtime_token,
        }
    }

    async fn run(
        &self,
        definition: &Definition<S, A>,
        resolver: &dyn Resolve<S, A>,
    ) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(definition.id()).await;

        let resolved = match self.cache.resolve(definition, resolver) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.bus.publish(
                    self.event(EventKind::ResolveFailed, definition, definition.name())
                        .with_reason(err.to_string()),
                );
                return Err(err);
            }
        };

        let effect = resolved.effect();
        if resolved.is_fresh() {
            self.bus
                .publish(self.event(EventKind::EffectResolved, definition, effect.name()));
        }

        self.registry
            .connect(effect)
            .map_err(|err| self.reject(definition, err))?;

        self.bus
            .publish(self.event(EventKind::EffectStarted, definition, effect.name()));
        Ok(())
    }

    async fn pause(&self, definition: &Definition<S, A>) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(definition.id()).await;

        let (effect, join) = self.disconnect(definition)?;
        self.settle(effect.name(), join).await;
        self.bus
            .publish(self.event(EventKind::EffectPaused, definition, effect.name()));
        Ok(())
    }

    async fn stop(&self, definition: &Definition<S, A>) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(definition.id()).await;

        let (effect, join) = self.disconnect(definition)?;
        self.settle(effect.name(), join).await;
        self.cache.evict(definition.id());
        self.bus
            .publish(self.event(EventKind::EffectStopped, definition, effect.name()));
        Ok(())
    }

    /// Shared pause step. Caller holds the definition lock.
    fn disconnect(
        &self,
        definition: &Definition<S, A>,
    ) -> Result<(EffectRef<S, A>, JoinHandle<WorkerExit>), LifecycleError> {
        let effect = self.cache.get(definition.id()).ok_or_else(|| {
            self.reject(
                definition,
                LifecycleError::NotResolved {
                    effect: definition.name().into(),
                },
            )
        })?;

        let join = self
            .registry
            .disconnect(&effect)
            .map_err(|err| self.reject(definition, err))?;
        Ok((effect, join))
    }

    /// Waits, up to the grace period, for a cancelled worker to exit.
    ///
    /// With no grace period the worker is left to exit on its own.
    async fn settle(&self, effect: &str, join: JoinHandle<WorkerExit>) -> Option<WorkerExit> {
        let grace = self.cfg.grace_period()?;
        match time::timeout(grace, join).await {
            Ok(result) => joined(effect, result),
            Err(_) => {
                tracing::warn!(effect, ?grace, "worker did not stop within grace");
                None
            }
        }
    }

    fn state(&self, definition: &Definition<S, A>) -> EffectState {
        match self.cache.get(definition.id()) {
            None => EffectState::Unresolved,
            Some(effect) if self.registry.is_connected(&effect) => EffectState::Running,
            Some(_) => EffectState::Paused,
        }
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_scope(self.id));

        let mut workers = self.registry.cancel_all();
        let Some(grace) = self.cfg.grace_period() else {
            tracing::debug!(workers = workers.len(), "shutdown without grace; workers not awaited");
            return Ok(());
        };

        let done = async {
            for (name, join) in workers.iter_mut() {
                joined(name, join.await);
            }
        };

        match time::timeout(grace, done).await {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::AllStoppedWithin).with_scope(self.id));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = workers
                    .iter()
                    .filter(|(_, join)| !join.is_finished())
                    .map(|(name, _)| name.to_string())
                    .collect();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_scope(self.id)
                        .with_reason(stuck.join(", ")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    fn event(&self, kind: EventKind, definition: &Definition<S, A>, effect: &str) -> Event {
        Event::new(kind)
            .with_effect(effect)
            .with_definition(definition.id().as_u64())
            .with_scope(self.id)
    }

    /// Mirrors a rejected call on the bus and hands the error back.
    fn reject(&self, definition: &Definition<S, A>, err: LifecycleError) -> LifecycleError {
        self.bus.publish(
            self.event(EventKind::LifecycleRejected, definition, err.effect())
                .with_reason(err.as_label()),
        );
        err
    }
}

/// Logs a failed worker join; `None` unless the worker returned normally.
fn joined(effect: &str, result: Result<WorkerExit, JoinError>) -> Option<WorkerExit> {
    match result {
        Ok(exit) => {
            tracing::trace!(effect, ?exit, "worker stopped");
            Some(exit)
        }
        Err(err) => {
            tracing::warn!(effect, error = %err, "worker join failed");
            None
        }
    }
}

impl<S, A> Drop for Root<S, A> {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.stream.clear();
    }
}

enum Scope<S, A> {
    Root(Root<S, A>),
    Child(Arc<EffectRunner<S, A>>),
}

/// Effect lifecycle manager for one scope.
///
/// Built with [`EffectRunner::builder`] (root) or [`EffectRunner::child`]
/// (nested scope). All scopes of one hierarchy share the root's resolved
/// instances, subscriptions and iteration stream; each scope brings its own
/// resolver.
pub struct EffectRunner<S, A> {
    scope: Scope<S, A>,
    id: u64,
    resolver: Arc<dyn Resolve<S, A>>,
}

impl<S, A> EffectRunner<S, A>
where
    S: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Starts building a root runner that sends effect output to `dispatcher`.
    pub fn builder(dispatcher: impl Dispatch<A>) -> RunnerBuilder<S, A> {
        RunnerBuilder::new(dispatcher)
    }

    pub(crate) fn from_root(root: Root<S, A>, resolver: Arc<dyn Resolve<S, A>>) -> Self {
        Self {
            id: root.id,
            scope: Scope::Root(root),
            resolver,
        }
    }

    /// Creates a child scope that reuses this scope's resolver.
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        self.child_scope(Arc::clone(&self.resolver))
    }

    /// Creates a child scope with its own resolver.
    ///
    /// Definitions first run through the child are resolved by `resolver`;
    /// the resulting instances still live in the root's tables.
    pub fn child_with_resolver(self: &Arc<Self>, resolver: impl Resolve<S, A>) -> Arc<Self> {
        self.child_scope(Arc::new(resolver))
    }

    fn child_scope(self: &Arc<Self>, resolver: Arc<dyn Resolve<S, A>>) -> Arc<Self> {
        let child = Arc::new(Self {
            scope: Scope::Child(Arc::clone(self)),
            id: next_scope_id(),
            resolver,
        });
        tracing::debug!(parent = self.id, scope = child.id, "child scope created");
        child
    }

    /// The root scope's tables; children walk up their parent chain.
    fn root(&self) -> &Root<S, A> {
        let mut current = self;
        loop {
            match &current.scope {
                Scope::Root(root) => return root,
                Scope::Child(parent) => current = parent,
            }
        }
    }

    /// Resolves `definition` (once) and connects it to the iteration stream.
    ///
    /// # Errors
    /// - [`LifecycleError::Resolution`] if the resolver fails (nothing cached)
    /// - [`LifecycleError::AlreadyRunning`] if the resolved effect is connected
    pub async fn run(&self, definition: &Definition<S, A>) -> Result<(), LifecycleError> {
        self.run_with(definition, self.resolver.as_ref()).await
    }

    /// Like [`run`](Self::run), resolving through `resolver` instead of the scope's own.
    pub async fn run_with(
        &self,
        definition: &Definition<S, A>,
        resolver: &dyn Resolve<S, A>,
    ) -> Result<(), LifecycleError> {
        tracing::trace!(scope = self.id, definition = %definition.id(), "run");
        self.root().run(definition, resolver).await
    }

    /// Disconnects the effect, keeping its resolved instance.
    ///
    /// Waits up to the configured grace for the effect's worker to exit, so
    /// no output of this connection reaches the dispatcher after it returns.
    ///
    /// # Errors
    /// - [`LifecycleError::NotResolved`] if the definition was never run (or was stopped)
    /// - [`LifecycleError::NotRunning`] if it is already paused
    pub async fn pause(&self, definition: &Definition<S, A>) -> Result<(), LifecycleError> {
        tracing::trace!(scope = self.id, definition = %definition.id(), "pause");
        self.root().pause(definition).await
    }

    /// Disconnects the effect and forgets its resolved instance.
    ///
    /// Performs the pause steps first, so it fails the same way `pause` does;
    /// in particular, stopping an already paused effect is rejected with
    /// [`LifecycleError::NotRunning`] and keeps the instance.
    pub async fn stop(&self, definition: &Definition<S, A>) -> Result<(), LifecycleError> {
        tracing::trace!(scope = self.id, definition = %definition.id(), "stop");
        self.root().stop(definition).await
    }

    /// Publishes one iteration to every running effect.
    ///
    /// Returns how many effects accepted it.
    pub fn next(&self, iteration: Iteration<S, A>) -> usize {
        self.root().stream.publish(iteration)
    }

    /// Current lifecycle state of `definition`.
    pub fn state(&self, definition: &Definition<S, A>) -> EffectState {
        self.root().state(definition)
    }

    /// Sorted names of running effects.
    pub fn running(&self) -> Vec<String> {
        self.root().registry.list()
    }

    /// Number of resolved (running or paused) definitions.
    pub fn resolved_count(&self) -> usize {
        self.root().cache.len()
    }

    /// Cancels every running effect and waits up to the configured grace.
    ///
    /// Resolved instances are kept: a later `run` reconnects them.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.root().shutdown().await
    }

    /// Event bus of the hierarchy.
    pub fn bus(&self) -> &Bus {
        &self.root().bus
    }

    /// Configuration of the hierarchy.
    pub fn config(&self) -> &RunnerConfig {
        &self.root().cfg
    }

    /// Unique id of this scope.
    pub fn scope_id(&self) -> u64 {
        self.id
    }

    /// Id of the root scope, which executes every call.
    pub fn root_id(&self) -> u64 {
        self.root().id
    }

    pub fn is_root(&self) -> bool {
        matches!(self.scope, Scope::Root(_))
    }

    pub fn parent(&self) -> Option<&Arc<Self>> {
        match &self.scope {
            Scope::Root(_) => None,
            Scope::Child(parent) => Some(parent),
        }
    }

    /// Number of ancestors (0 for the root).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }
}
