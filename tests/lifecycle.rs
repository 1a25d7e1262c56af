use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{StreamExt, future};
use tokio::sync::mpsc;
use tokio::time::timeout;

use effectvisor::{
    Deferred, Definition, EffectFn, EffectRef, EffectRunner, EffectState, EventKind, Injector,
    Iteration, Iterations, LifecycleError, Resolve, ResolveError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Action {
    Watch,
    Next,
    Ping,
    Pong(&'static str),
}

type Runner = EffectRunner<u32, Action>;

/// Resolver that counts how often it is asked.
#[derive(Default)]
struct CountingResolver {
    calls: Arc<AtomicUsize>,
    injector: Injector,
}

impl CountingResolver {
    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Resolve<u32, Action> for CountingResolver {
    fn resolve(&self, definition: &Definition<u32, Action>) -> Result<EffectRef<u32, Action>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        definition.instantiate(&self.injector)
    }
}

fn watcher() -> Definition<u32, Action> {
    Definition::new("watcher", |_| {
        Ok(EffectFn::arc("watcher", |input| {
            input
                .filter(|it| future::ready(it.action == Action::Watch))
                .map(|_| Action::Next)
                .boxed()
        }))
    })
}

fn ponger(name: &'static str) -> Definition<u32, Action> {
    Definition::new(name, move |_| {
        Ok(EffectFn::arc(name, move |input| {
            input
                .filter(|it| future::ready(it.action == Action::Ping))
                .map(move |_| Action::Pong(name))
                .boxed()
        }))
    })
}

async fn counted_runner() -> (Arc<Runner>, mpsc::UnboundedReceiver<Action>, Arc<AtomicUsize>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let resolver = CountingResolver::default();
    let calls = resolver.calls();
    let runner = Runner::builder(tx)
        .with_resolver(resolver)
        .build()
        .await
        .expect("build runner");
    (runner, rx, calls)
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Action>) -> Action {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("output in time")
        .expect("dispatcher open")
}

async fn quiet(rx: &mut mpsc::UnboundedReceiver<Action>) -> bool {
    timeout(Duration::from_millis(50), rx.recv()).await.is_err()
}

#[tokio::test]
async fn watch_produces_next_across_pause_and_resume() {
    let (runner, mut rx, calls) = counted_runner().await;
    let a = watcher();

    runner.run(&a).await.expect("run");
    assert_eq!(runner.next(Iteration::new(0, Action::Watch)), 1);
    assert_eq!(recv(&mut rx).await, Action::Next);
    assert!(quiet(&mut rx).await);

    runner.pause(&a).await.expect("pause");
    assert_eq!(runner.next(Iteration::new(1, Action::Watch)), 0);
    assert!(quiet(&mut rx).await);

    runner.run(&a).await.expect("resume");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.next(Iteration::new(2, Action::Watch)), 1);
    assert_eq!(recv(&mut rx).await, Action::Next);
}

#[tokio::test]
async fn deferred_scheduler_is_transparent_to_lifecycle() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let resolver = CountingResolver::default();
    let calls = resolver.calls();
    let runner = Runner::builder(tx)
        .with_resolver(resolver)
        .with_scheduler(Deferred::new())
        .build()
        .await
        .expect("build runner");
    let a = watcher();
    let b = ponger("b");

    runner.run(&a).await.expect("run a");
    runner.run(&b).await.expect("run b");
    for action in [Action::Watch, Action::Ping, Action::Watch] {
        assert_eq!(runner.next(Iteration::new(0, action)), 2);
    }
    let mut got = Vec::new();
    for _ in 0..3 {
        got.push(recv(&mut rx).await);
    }
    assert_eq!(got.iter().filter(|action| **action == Action::Next).count(), 2);
    assert!(got.contains(&Action::Pong("b")));
    assert!(quiet(&mut rx).await);

    runner.pause(&a).await.expect("pause");
    assert_eq!(runner.state(&a), EffectState::Paused);
    assert_eq!(runner.next(Iteration::new(1, Action::Watch)), 1);
    assert!(quiet(&mut rx).await);

    runner.run(&a).await.expect("resume");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    runner.next(Iteration::new(2, Action::Watch));
    assert_eq!(recv(&mut rx).await, Action::Next);
}

#[tokio::test]
async fn pause_then_run_resolves_once() {
    let (runner, _rx, calls) = counted_runner().await;
    let a = watcher();

    for _ in 0..3 {
        runner.run(&a).await.expect("run");
        runner.pause(&a).await.expect("pause");
    }
    runner.run(&a).await.expect("run");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.resolved_count(), 1);
}

#[tokio::test]
async fn stop_then_run_resolves_again() {
    let (runner, _rx, calls) = counted_runner().await;
    let a = watcher();

    runner.run(&a).await.expect("run");
    runner.stop(&a).await.expect("stop");
    assert_eq!(runner.state(&a), EffectState::Unresolved);
    runner.run(&a).await.expect("run again");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn double_run_is_rejected_without_side_effects() {
    let (runner, mut rx, calls) = counted_runner().await;
    let a = watcher();

    runner.run(&a).await.expect("run");
    let err = runner.run(&a).await.err().expect("second run fails");
    assert!(matches!(err, LifecycleError::AlreadyRunning { ref effect } if &**effect == "watcher"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Still exactly one connection.
    assert_eq!(runner.next(Iteration::new(0, Action::Watch)), 1);
    assert_eq!(recv(&mut rx).await, Action::Next);
    assert!(quiet(&mut rx).await);
}

#[tokio::test]
async fn pause_and_stop_of_unknown_definition_are_rejected() {
    let (runner, _rx, calls) = counted_runner().await;
    let a = watcher();

    let err = runner.pause(&a).await.err().expect("pause fails");
    assert!(matches!(err, LifecycleError::NotResolved { .. }));
    let err = runner.stop(&a).await.err().expect("stop fails");
    assert!(matches!(err, LifecycleError::NotResolved { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn double_pause_and_stop_after_pause_are_rejected() {
    let (runner, _rx, _calls) = counted_runner().await;
    let a = watcher();

    runner.run(&a).await.expect("run");
    runner.pause(&a).await.expect("pause");

    let err = runner.pause(&a).await.err().expect("second pause fails");
    assert_eq!(err.as_label(), "effect_not_running");
    let err = runner.stop(&a).await.err().expect("stop of paused fails");
    assert_eq!(err.as_label(), "effect_not_running");
    assert_eq!(runner.state(&a), EffectState::Paused);
}

#[tokio::test]
async fn resolver_failure_caches_nothing() {
    let (tx, _rx) = mpsc::unbounded_channel::<Action>();
    let runner = Runner::builder(tx).build().await.expect("build");
    let mut events = runner.bus().subscribe();
    let needs_api: Definition<u32, Action> = Definition::new("needs-api", |injector| {
        let _api = injector.get::<String>()?;
        Ok(EffectFn::arc("needs-api", |input: Iterations<u32, Action>| {
            input.map(|it| it.action.clone()).boxed()
        }))
    });

    let err = runner.run(&needs_api).await.err().expect("resolution fails");
    assert!(matches!(
        err,
        LifecycleError::Resolution { source: ResolveError::MissingDependency { .. }, .. }
    ));
    assert_eq!(runner.state(&needs_api), EffectState::Unresolved);
    assert_eq!(runner.resolved_count(), 0);

    let ev = events.recv().await.expect("event");
    assert_eq!(ev.kind, EventKind::ResolveFailed);
}

#[tokio::test]
async fn child_calls_act_on_the_root() {
    let (root, mut rx, calls) = counted_runner().await;
    let child = root.child();
    let grandchild = child.child();
    let a = watcher();

    grandchild.run(&a).await.expect("run via grandchild");
    assert_eq!(root.state(&a), EffectState::Running);
    assert_eq!(child.running(), vec!["watcher".to_string()]);

    assert_eq!(child.next(Iteration::new(0, Action::Watch)), 1);
    assert_eq!(recv(&mut rx).await, Action::Next);

    let err = root.run(&a).await.err().expect("already running at root");
    assert!(matches!(err, LifecycleError::AlreadyRunning { .. }));

    child.pause(&a).await.expect("pause via child");
    assert_eq!(grandchild.state(&a), EffectState::Paused);
    root.run(&a).await.expect("resume via root");
    grandchild.stop(&a).await.expect("stop via grandchild");
    assert_eq!(root.state(&a), EffectState::Unresolved);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn child_resolver_is_used_for_its_own_calls() {
    let (root, _rx, root_calls) = counted_runner().await;
    let scoped = CountingResolver::default();
    let scoped_calls = scoped.calls();
    let child = root.child_with_resolver(scoped);
    let a = watcher();

    child.run(&a).await.expect("run via child");
    assert_eq!(scoped_calls.load(Ordering::SeqCst), 1);
    assert_eq!(root_calls.load(Ordering::SeqCst), 0);

    // Cached at the root: the root does not resolve it again.
    root.pause(&a).await.expect("pause");
    root.run(&a).await.expect("resume via root");
    assert_eq!(root_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn iterations_fan_out_and_cancel_in_isolation() {
    let (runner, mut rx, _calls) = counted_runner().await;
    let (h1, h2) = (ponger("h1"), ponger("h2"));
    runner.run(&h1).await.expect("run h1");
    runner.run(&h2).await.expect("run h2");

    assert_eq!(runner.next(Iteration::new(0, Action::Ping)), 2);
    let mut got = vec![recv(&mut rx).await, recv(&mut rx).await];
    got.sort_by_key(|a| format!("{a:?}"));
    assert_eq!(got, vec![Action::Pong("h1"), Action::Pong("h2")]);
    assert!(quiet(&mut rx).await);

    runner.pause(&h1).await.expect("pause h1");
    assert_eq!(runner.next(Iteration::new(1, Action::Ping)), 1);
    assert_eq!(recv(&mut rx).await, Action::Pong("h2"));
    assert!(quiet(&mut rx).await);
}

#[tokio::test]
async fn lifecycle_events_are_published_in_order() {
    let (runner, _rx, _calls) = counted_runner().await;
    let mut events = runner.bus().subscribe();
    let a = watcher();

    runner.run(&a).await.expect("run");
    runner.pause(&a).await.expect("pause");
    runner.run(&a).await.expect("resume");
    runner.stop(&a).await.expect("stop");

    let mut kinds = Vec::new();
    while let Ok(ev) = events.try_recv() {
        assert_eq!(ev.definition, Some(a.id().as_u64()));
        kinds.push(ev.kind);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::EffectResolved,
            EventKind::EffectStarted,
            EventKind::EffectPaused,
            EventKind::EffectStarted,
            EventKind::EffectStopped,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_of_one_definition_connect_once() {
    let (runner, _rx, calls) = counted_runner().await;
    let a = watcher();

    let attempts = (0..8).map(|_| {
        let runner = Arc::clone(&runner);
        let a = a.clone();
        tokio::spawn(async move { runner.run(&a).await })
    });
    let results = future::join_all(attempts).await;

    let ok = results
        .into_iter()
        .map(|joined| joined.expect("task joins"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(ok, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.running(), vec!["watcher".to_string()]);
}

#[tokio::test]
async fn completed_effect_stays_running_until_paused() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
    let runner = Runner::builder(tx).build().await.expect("build");
    let mut events = runner.bus().subscribe();
    let once: Definition<u32, Action> = Definition::new("once", |_| {
        Ok(EffectFn::arc("once", |input| input.take(1).map(|_| Action::Next).boxed()))
    });

    runner.run(&once).await.expect("run");
    runner.next(Iteration::new(0, Action::Watch));
    assert_eq!(recv(&mut rx).await, Action::Next);

    loop {
        let ev = timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("event in time")
            .expect("bus open");
        if ev.kind == EventKind::EffectCompleted {
            break;
        }
    }
    assert_eq!(runner.state(&once), EffectState::Running);
    runner.pause(&once).await.expect("pause completed effect");
    runner.run(&once).await.expect("reconnect");
    runner.next(Iteration::new(1, Action::Watch));
    assert_eq!(recv(&mut rx).await, Action::Next);
}
