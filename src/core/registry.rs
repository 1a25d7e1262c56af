//! # Subscription registry: resolved effect → live stream connection.
//!
//! Keyed by effect **instance** (pointer identity of the `Arc`), so an effect
//! is connected at most once no matter how many definitions resolve to it.
//!
//! ## Rules
//! - `connect` on a connected instance fails with `AlreadyRunning`
//! - the table lock is never held while an effect's `connect` runs
//! - `disconnect` on an unconnected instance fails with `NotRunning`
//! - a connection whose output already completed still counts as connected
//!   until it is explicitly disconnected

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    effects::EffectRef,
    error::LifecycleError,
    stream::{IterationStream, Subscription, WorkerExit},
};

/// Pointer identity of a resolved effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EffectKey(usize);

impl EffectKey {
    fn of<S, A>(effect: &EffectRef<S, A>) -> Self {
        Self(Arc::as_ptr(effect) as *const () as usize)
    }
}

fn already_running<S: 'static, A: 'static>(effect: &EffectRef<S, A>) -> LifecycleError {
    LifecycleError::AlreadyRunning {
        effect: effect.name().into(),
    }
}

/// Live subscriptions of one root runner.
pub(crate) struct Registry<S, A> {
    live: RwLock<HashMap<EffectKey, Subscription<S, A>>>,
    stream: IterationStream<S, A>,
    runtime_token: CancellationToken,
}

impl<S, A> Registry<S, A>
where
    S: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    pub(crate) fn new(stream: IterationStream<S, A>, runtime_token: CancellationToken) -> Self {
        Self {
            live: RwLock::new(HashMap::new()),
            stream,
            runtime_token,
        }
    }

    /// Connects `effect` to the iteration stream.
    ///
    /// The effect's own `connect` runs outside the table lock; the entry is
    /// claimed afterwards. If another caller claimed the same instance in
    /// between, the new connection is cancelled and `AlreadyRunning` returned.
    pub(crate) fn connect(&self, effect: &EffectRef<S, A>) -> Result<(), LifecycleError> {
        let key = EffectKey::of(effect);
        if self.live.read().contains_key(&key) {
            return Err(already_running(effect));
        }

        let sub = self
            .stream
            .attach(Arc::clone(effect), self.runtime_token.child_token());

        let lost = match self.live.write().entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(sub);
                return Ok(());
            }
            Entry::Occupied(_) => sub,
        };
        let _ = lost.cancel();
        Err(already_running(effect))
    }

    /// Disconnects `effect` and returns its worker handle.
    pub(crate) fn disconnect(
        &self,
        effect: &EffectRef<S, A>,
    ) -> Result<JoinHandle<WorkerExit>, LifecycleError> {
        let sub = self
            .live
            .write()
            .remove(&EffectKey::of(effect))
            .ok_or_else(|| LifecycleError::NotRunning {
                effect: effect.name().into(),
            })?;
        let (_, join) = sub.cancel();
        Ok(join)
    }

    pub(crate) fn is_connected(&self, effect: &EffectRef<S, A>) -> bool {
        self.live.read().contains_key(&EffectKey::of(effect))
    }

    /// Sorted names of connected effects.
    pub(crate) fn list(&self) -> Vec<String> {
        let live = self.live.read();
        let mut names: Vec<String> = live.values().map(|sub| sub.effect().to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Disconnects everything; returns the worker handles to join.
    pub(crate) fn cancel_all(&self) -> Vec<(Arc<str>, JoinHandle<WorkerExit>)> {
        let subs: Vec<Subscription<S, A>> = {
            let mut live = self.live.write();
            live.drain().map(|(_, sub)| sub).collect()
        };
        subs.into_iter().map(Subscription::cancel).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.live.read().len()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::effects::{EffectFn, Iteration};
    use crate::events::Bus;
    use crate::output::{Dispatch, Immediate, Outlet, Schedule};

    fn registry() -> (Registry<u8, u8>, IterationStream<u8, u8>) {
        let (tx, _rx) = mpsc::unbounded_channel::<u8>();
        let dispatcher: Arc<dyn Dispatch<u8>> = Arc::new(tx);
        let scheduler: Arc<dyn Schedule<u8>> = Arc::new(Immediate);
        let stream = IterationStream::new(4, Outlet::new(dispatcher, scheduler), Bus::new(4));
        (Registry::new(stream.clone(), CancellationToken::new()), stream)
    }

    #[tokio::test]
    async fn double_connect_is_rejected() {
        let (registry, stream) = registry();
        let effect: EffectRef<u8, u8> = EffectFn::arc("twice", |input| input.map(|it| it.action).boxed());

        registry.connect(&effect).expect("first connect");
        let err = registry.connect(&effect).err().expect("second connect fails");
        assert!(matches!(err, LifecycleError::AlreadyRunning { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(stream.len(), 1);
    }

    #[tokio::test]
    async fn disconnect_detaches_from_stream() {
        let (registry, stream) = registry();
        let effect: EffectRef<u8, u8> = EffectFn::arc("once", |input| input.map(|it| it.action).boxed());

        registry.connect(&effect).expect("connect");
        assert_eq!(registry.list(), vec!["once".to_string()]);
        let join = registry.disconnect(&effect).expect("disconnect");
        assert_eq!(stream.publish(Iteration::new(0, 0)), 0);
        assert_eq!(join.await.expect("joins"), WorkerExit::Cancelled);

        let err = registry.disconnect(&effect).err().expect("not running");
        assert_eq!(err.as_label(), "effect_not_running");
        assert!(!registry.is_connected(&effect));
    }
}
