//! # Resolver cache: definition → resolved effect.
//!
//! An entry exists from the first successful `run` until `stop`. `pause`
//! leaves it alone, so resuming reuses the same instance.
//!
//! The cache does not serialize resolution itself; callers hold the
//! definition's lock (see [`DefinitionLocks`](super::locks::DefinitionLocks))
//! so a definition is resolved at most once per cycle.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    effects::{Definition, DefinitionId, EffectRef, Resolve},
    error::LifecycleError,
};

/// Outcome of [`ResolverCache::resolve`].
pub(crate) enum Resolved<S, A> {
    /// Instance was already cached.
    Cached(EffectRef<S, A>),
    /// Resolver ran and the instance was cached.
    Fresh(EffectRef<S, A>),
}

impl<S, A> Resolved<S, A> {
    pub(crate) fn effect(&self) -> &EffectRef<S, A> {
        match self {
            Resolved::Cached(effect) | Resolved::Fresh(effect) => effect,
        }
    }

    pub(crate) fn is_fresh(&self) -> bool {
        matches!(self, Resolved::Fresh(_))
    }
}

pub(crate) struct ResolverCache<S, A> {
    resolved: RwLock<HashMap<DefinitionId, EffectRef<S, A>>>,
}

impl<S: 'static, A: 'static> ResolverCache<S, A> {
    pub(crate) fn new() -> Self {
        Self {
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached instance, or asks `resolver` and caches its answer.
    ///
    /// A failing resolver leaves the cache untouched.
    pub(crate) fn resolve(
        &self,
        definition: &Definition<S, A>,
        resolver: &dyn Resolve<S, A>,
    ) -> Result<Resolved<S, A>, LifecycleError> {
        if let Some(effect) = self.get(definition.id()) {
            return Ok(Resolved::Cached(effect));
        }

        let effect = resolver
            .resolve(definition)
            .map_err(|source| LifecycleError::Resolution {
                effect: definition.name().into(),
                source,
            })?;

        self.resolved
            .write()
            .insert(definition.id(), Arc::clone(&effect));
        Ok(Resolved::Fresh(effect))
    }

    pub(crate) fn get(&self, id: DefinitionId) -> Option<EffectRef<S, A>> {
        self.resolved.read().get(&id).cloned()
    }

    /// Removes the entry; the next `run` resolves again.
    pub(crate) fn evict(&self, id: DefinitionId) -> Option<EffectRef<S, A>> {
        self.resolved.write().remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.resolved.read().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::StreamExt;

    use super::*;
    use crate::effects::{EffectFn, Injector};
    use crate::error::ResolveError;

    fn counting(calls: Arc<AtomicUsize>) -> Definition<(), u8> {
        Definition::new("counted", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(EffectFn::arc("counted", |input| input.map(|it| it.action).boxed()))
        })
    }

    #[test]
    fn resolves_once_until_evicted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let def = counting(Arc::clone(&calls));
        let cache = ResolverCache::new();
        let injector = Injector::new();

        let first = cache.resolve(&def, &injector).expect("first");
        let second = cache.resolve(&def, &injector).expect("second");
        assert!(first.is_fresh());
        assert!(!second.is_fresh());
        assert!(Arc::ptr_eq(first.effect(), second.effect()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(cache.evict(def.id()).is_some());
        assert!(cache.resolve(&def, &injector).expect("third").is_fresh());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failure_is_not_cached() {
        let def: Definition<(), u8> = Definition::new("broken", |_| Err(ResolveError::factory("boom")));
        let cache = ResolverCache::new();

        let err = cache.resolve(&def, &Injector::new()).err().expect("fails");
        assert_eq!(err.as_label(), "effect_resolution_failed");
        assert_eq!(cache.len(), 0);
        assert!(cache.get(def.id()).is_none());
    }
}
