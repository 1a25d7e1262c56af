//! Runtime core: lifecycle orchestration over the iteration stream.
//!
//! The public API from this module is [`EffectRunner`] (with [`EffectState`]),
//! its [`RunnerBuilder`] and [`RunnerConfig`].
//!
//! Internal modules:
//! - [`runner`]: scope hierarchy, forwarding to the root, run/pause/stop/next, shutdown;
//! - [`builder`]: root construction, subscriber wiring, bootstrap definitions;
//! - [`cache`]: definition → resolved effect (resolve-once);
//! - [`registry`]: resolved effect → live subscription;
//! - [`locks`]: per-definition ordering of lifecycle calls.

mod builder;
mod cache;
mod config;
mod locks;
mod registry;
mod runner;

pub use builder::RunnerBuilder;
pub use config::RunnerConfig;
pub use runner::{EffectRunner, EffectState};
