use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    effects::{Definition, Injector, Resolve},
    error::LifecycleError,
    events::Bus,
    output::{Dispatch, Immediate, Outlet, Schedule},
    stream::IterationStream,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{
    config::RunnerConfig,
    runner::{EffectRunner, Root},
};

/// Builder for a root [`EffectRunner`].
///
/// Defaults: [`RunnerConfig::default`], an empty [`Injector`] as resolver,
/// [`Immediate`] scheduling, no subscribers, nothing bootstrapped.
pub struct RunnerBuilder<S, A> {
    cfg: RunnerConfig,
    dispatcher: Arc<dyn Dispatch<A>>,
    resolver: Arc<dyn Resolve<S, A>>,
    scheduler: Arc<dyn Schedule<A>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bootstrap: Vec<Definition<S, A>>,
}

impl<S, A> RunnerBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Creates a builder that sends effect output to `dispatcher`.
    pub fn new(dispatcher: impl Dispatch<A>) -> Self {
        Self {
            cfg: RunnerConfig::default(),
            dispatcher: Arc::new(dispatcher),
            resolver: Arc::new(Injector::new()),
            scheduler: Arc::new(Immediate),
            subscribers: Vec::new(),
            bootstrap: Vec::new(),
        }
    }

    pub fn with_config(mut self, cfg: RunnerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the root scope's resolver.
    pub fn with_resolver(mut self, resolver: impl Resolve<S, A>) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Sets how effect output reaches the dispatcher.
    pub fn with_scheduler(mut self, scheduler: impl Schedule<A>) -> Self {
        self.scheduler = Arc::new(scheduler);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle and delivery events through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Definitions to `run`, in order, as part of `build`.
    pub fn with_bootstrap(mut self, definitions: Vec<Definition<S, A>>) -> Self {
        self.bootstrap = definitions;
        self
    }

    /// Builds the root runner and runs the bootstrap definitions.
    ///
    /// Must be called from within a tokio runtime. Fails with the first
    /// bootstrap error; the partially built runner is dropped, which cancels
    /// whatever had already started.
    pub async fn build(mut self) -> Result<Arc<EffectRunner<S, A>>, LifecycleError> {
        let bootstrap = std::mem::take(&mut self.bootstrap);
        let runner = self.build_root();

        for definition in &bootstrap {
            runner.run(definition).await?;
        }
        Ok(runner)
    }

    /// Builds the root runner without running anything.
    pub(crate) fn build_root(self) -> Arc<EffectRunner<S, A>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
            subscriber_listener(&bus, subs, runtime_token.clone());
        }

        let outlet = Outlet::new(self.dispatcher, self.scheduler);
        let stream = IterationStream::new(self.cfg.input_capacity_clamped(), outlet, bus.clone());
        let root = Root::new(self.cfg, bus, stream, runtime_token);
        Arc::new(EffectRunner::from_root(root, self.resolver))
    }
}

/// Forwards bus events to the subscriber set until the root is dropped.
fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged; events skipped");
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::StreamExt;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use super::*;
    use crate::effects::EffectFn;
    use crate::error::ResolveError;
    use crate::events::{Event, EventKind};
    use crate::EffectState;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn echo(name: &'static str) -> Definition<u8, u8> {
        Definition::new(name, move |_| Ok(EffectFn::arc(name, |input| input.map(|it| it.action).boxed())))
    }

    #[tokio::test]
    async fn bootstrap_runs_in_order_and_reaches_subscribers() {
        let (tx, _rx) = mpsc::unbounded_channel::<u8>();
        let recorder = Arc::new(Recorder::default());
        let (a, b) = (echo("a"), echo("b"));

        let runner = EffectRunner::builder(tx)
            .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
            .with_bootstrap(vec![a.clone(), b.clone()])
            .build()
            .await
            .expect("build");

        assert_eq!(runner.state(&a), EffectState::Running);
        assert_eq!(runner.running(), vec!["a".to_string(), "b".to_string()]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let seen = recorder.0.lock().clone();
        assert_eq!(
            seen,
            vec![
                EventKind::EffectResolved,
                EventKind::EffectStarted,
                EventKind::EffectResolved,
                EventKind::EffectStarted,
            ]
        );
    }

    #[tokio::test]
    async fn bootstrap_failure_is_returned() {
        let (tx, _rx) = mpsc::unbounded_channel::<u8>();
        let broken: Definition<u8, u8> = Definition::new("broken", |_| Err(ResolveError::factory("nope")));

        let err = EffectRunner::builder(tx)
            .with_bootstrap(vec![broken])
            .build()
            .await
            .err()
            .expect("bootstrap fails");
        assert!(matches!(err, LifecycleError::Resolution { .. }));
    }
}
