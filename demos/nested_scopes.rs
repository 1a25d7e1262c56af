//! # Example: nested_scopes
//!
//! Feature modules get their own scope and resolver, while the effects they
//! start run in the root's shared tables.
//!
//! ```text
//! root (Injector { ApiUrl })
//!  └── checkout scope (Injector { Currency } → root injector)
//!        └── run(price_watcher) ──► resolved with the checkout injector
//!                                 ──► connected at the root
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example nested_scopes
//! ```

use std::sync::Arc;

use effectvisor::{Definition, EffectFn, EffectRunner, EffectState, Injector, Iteration};
use futures::StreamExt;
use tokio::sync::mpsc;

struct ApiUrl(&'static str);
struct Currency(&'static str);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root_injector = Arc::new(Injector::new().provide(ApiUrl("https://shop.invalid")));
    let (tx, mut dispatched) = mpsc::unbounded_channel::<String>();
    let root = EffectRunner::<u32, String>::builder(tx)
        .with_resolver(Injector::child_of(Arc::clone(&root_injector)))
        .build()
        .await?;

    let checkout = root.child_with_resolver(Injector::child_of(root_injector).provide(Currency("EUR")));

    let price_watcher: Definition<u32, String> = Definition::new("price-watcher", |injector| {
        let api = injector.get::<ApiUrl>()?;
        let currency = injector.get::<Currency>()?;
        Ok(EffectFn::arc("price-watcher", move |input| {
            let (api, currency) = (Arc::clone(&api), Arc::clone(&currency));
            input
                .map(move |it| format!("{} {} {} via {}", it.action, it.state, currency.0, api.0))
                .boxed()
        }))
    });

    // The root injector has no Currency: resolving there fails.
    if let Err(err) = root.run(&price_watcher).await {
        println!("[root] {err}");
    }

    checkout.run(&price_watcher).await?;
    println!(
        "[root] state={:?} running={:?} depth(checkout)={}",
        root.state(&price_watcher),
        root.running(),
        checkout.depth()
    );

    root.next(Iteration::new(42, "price".to_string()));
    println!("[store] {:?}", dispatched.recv().await);

    // Paused through the root, resumed through the child: no second resolution.
    root.pause(&price_watcher).await?;
    checkout.run(&price_watcher).await?;
    assert_eq!(root.state(&price_watcher), EffectState::Running);

    checkout.stop(&price_watcher).await?;
    println!("[root] after stop: {:?}", root.state(&price_watcher));
    Ok(())
}
