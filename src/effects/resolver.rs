//! # Resolver capability and a minimal dependency container.
//!
//! The runner never builds effects itself: it asks a [`Resolve`] implementation,
//! exactly once per definition per scope chain, and caches the result.
//!
//! [`Injector`] is the reference resolver: a typed map of shared dependencies
//! with an optional parent, handed to each definition's factory.
//!
//! ```text
//! root Injector { Api }
//!     └── child Injector { Session }   // child.get::<Api>() walks up to the root
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ResolveError;

use super::definition::Definition;
use super::effect::EffectRef;

/// Turns a [`Definition`] into a running effect instance.
pub trait Resolve<S, A>: Send + Sync + 'static {
    /// Materializes `definition`.
    ///
    /// Failures propagate to the `run` caller as
    /// [`LifecycleError::Resolution`](crate::LifecycleError::Resolution).
    fn resolve(&self, definition: &Definition<S, A>) -> Result<EffectRef<S, A>, ResolveError>;
}

/// Typed dependency container with parent lookup.
#[derive(Default)]
pub struct Injector {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    parent: Option<Arc<Injector>>,
}

impl Injector {
    /// Creates an empty root injector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty injector that falls back to `parent` on lookup misses.
    pub fn child_of(parent: Arc<Injector>) -> Self {
        Self {
            values: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Registers a dependency, replacing any previous value of the same type.
    pub fn provide<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.provide_arc(Arc::new(value))
    }

    /// Registers an already shared dependency.
    pub fn provide_arc<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.values.insert(TypeId::of::<T>(), value);
        self
    }

    /// Looks up a dependency in this injector, then in its ancestors.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let mut current = Some(self);
        while let Some(injector) = current {
            if let Some(value) = injector.values.get(&TypeId::of::<T>()) {
                return Arc::clone(value)
                    .downcast::<T>()
                    .map_err(|_| ResolveError::MissingDependency {
                        type_name: type_name::<T>(),
                    });
            }
            current = injector.parent.as_deref();
        }
        Err(ResolveError::MissingDependency {
            type_name: type_name::<T>(),
        })
    }

    /// True if the dependency is available in this injector chain.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.get::<T>().is_ok()
    }
}

impl<S: 'static, A: 'static> Resolve<S, A> for Injector {
    fn resolve(&self, definition: &Definition<S, A>) -> Result<EffectRef<S, A>, ResolveError> {
        definition.instantiate(self)
    }
}
