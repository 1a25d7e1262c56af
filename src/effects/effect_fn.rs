//! # Function-backed effect (`EffectFn`)
//!
//! [`EffectFn`] wraps a closure `F: Fn(Iterations) -> Actions`, producing a fresh
//! output stream per connection. State that must survive a pause/run cycle
//! belongs in the closure's captures (behind `Arc<...>`), since the effect
//! instance itself is kept across pauses.
//!
//! ## Example
//! ```rust
//! use futures::{future, StreamExt};
//! use effectvisor::{EffectFn, EffectRef};
//!
//! let watcher: EffectRef<(), &'static str> = EffectFn::arc("watcher", |input| {
//!     input
//!         .filter(|it| future::ready(it.action == "Watch"))
//!         .map(|_| "Next")
//!         .boxed()
//! });
//!
//! assert_eq!(watcher.name(), "watcher");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use super::effect::{Actions, Effect, EffectRef, Iterations};

/// Function-backed effect implementation.
pub struct EffectFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> EffectFn<F> {
    /// Creates a new function-backed effect.
    ///
    /// Prefer [`EffectFn::arc`] when you immediately need an [`EffectRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the effect and returns it as a shared handle.
    ///
    /// The closure's input/output types are inferred from the expected [`EffectRef`].
    pub fn arc<S, A>(name: impl Into<Cow<'static, str>>, f: F) -> EffectRef<S, A>
    where
        F: Fn(Iterations<S, A>) -> Actions<A> + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, f))
    }
}

impl<S, A, F> Effect<S, A> for EffectFn<F>
where
    F: Fn(Iterations<S, A>) -> Actions<A> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self, input: Iterations<S, A>) -> Actions<A> {
        (self.f)(input)
    }
}
