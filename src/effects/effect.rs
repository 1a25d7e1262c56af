//! # Effect abstraction.
//!
//! An [`Effect`] is a unit of reactive logic: it receives the stream of
//! iterations published by the host and returns a stream of actions that
//! the runner forwards to the dispatcher.
//!
//! `connect` is called once per `run`. The input stream ends when the effect
//! is paused or stopped; the output stream may end earlier (e.g. a `take(1)`),
//! which is not an error.

use std::sync::Arc;

use futures::stream::BoxStream;

use super::Iteration;

/// Input handed to an effect on every connection.
pub type Iterations<S, A> = BoxStream<'static, Arc<Iteration<S, A>>>;

/// Output produced by an effect; every item is dispatched to the host.
pub type Actions<A> = BoxStream<'static, A>;

/// Shared handle to a resolved effect (`Arc<dyn Effect>`).
pub type EffectRef<S, A> = Arc<dyn Effect<S, A>>;

/// # Stream transformer from iterations to actions.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use futures::StreamExt;
/// use effectvisor::{Actions, Effect, Iterations};
///
/// struct Echo;
///
/// impl Effect<u32, &'static str> for Echo {
///     fn name(&self) -> &str { "echo" }
///
///     fn connect(&self, input: Iterations<u32, &'static str>) -> Actions<&'static str> {
///         input.map(|it| it.action).boxed()
///     }
/// }
/// ```
pub trait Effect<S, A>: Send + Sync + 'static {
    /// Returns a stable, human-readable effect name.
    fn name(&self) -> &str;

    /// Wires the effect to a fresh input stream and returns its output.
    ///
    /// Called synchronously from `run`; heavy work belongs inside the returned stream.
    fn connect(&self, input: Iterations<S, A>) -> Actions<A>;
}
