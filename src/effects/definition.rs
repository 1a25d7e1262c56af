//! # Effect definitions.
//!
//! A [`Definition`] identifies *what* effect to run: a display name plus a
//! factory that builds the effect from an [`Injector`]. It is an identity
//! token: every [`Definition::new`] mints a fresh [`DefinitionId`], clones
//! share it, and two definitions are the same effect iff their ids match.
//! Two separately created definitions with identical factories are distinct.
//!
//! ## Example
//! ```rust
//! use futures::StreamExt;
//! use effectvisor::{Definition, EffectFn};
//!
//! let a: Definition<(), u8> = Definition::new("doubler", |_injector| {
//!     Ok(EffectFn::arc("doubler", |input| input.map(|it| it.action * 2).boxed()))
//! });
//! let b = a.clone();
//! assert_eq!(a, b);
//! assert_eq!(a.name(), "doubler");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::error::ResolveError;

use super::effect::EffectRef;
use super::resolver::Injector;

/// Global counter for definition identities.
static DEFINITION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a [`Definition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(u64);

impl DefinitionId {
    fn next() -> Self {
        Self(DEFINITION_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric id (as carried by events).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def#{}", self.0)
    }
}

type Factory<S, A> = dyn Fn(&Injector) -> Result<EffectRef<S, A>, ResolveError> + Send + Sync;

struct Inner<S, A> {
    id: DefinitionId,
    name: Cow<'static, str>,
    factory: Box<Factory<S, A>>,
}

/// Recipe for an effect, compared by identity.
pub struct Definition<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Definition<S, A> {
    /// Creates a definition from a factory.
    ///
    /// The factory runs once per resolution: on the first `run`, and again on
    /// the first `run` after a `stop`.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, factory: F) -> Self
    where
        F: Fn(&Injector) -> Result<EffectRef<S, A>, ResolveError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                id: DefinitionId::next(),
                name: name.into(),
                factory: Box::new(factory),
            }),
        }
    }

    /// Creates a definition that always resolves to the given instance.
    pub fn of(effect: EffectRef<S, A>) -> Self
    where
        S: 'static,
        A: 'static,
    {
        let name = effect.name().to_string();
        Self::new(name, move |_| Ok(Arc::clone(&effect)))
    }

    /// Identity of this definition.
    pub fn id(&self) -> DefinitionId {
        self.inner.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Runs the factory against `injector`.
    ///
    /// Called by resolvers; the runner never calls it directly.
    pub fn instantiate(&self, injector: &Injector) -> Result<EffectRef<S, A>, ResolveError> {
        (self.inner.factory)(injector)
    }
}

impl<S, A> Clone for Definition<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> PartialEq for Definition<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<S, A> Eq for Definition<S, A> {}

impl<S, A> Hash for Definition<S, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<S, A> fmt::Debug for Definition<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}
