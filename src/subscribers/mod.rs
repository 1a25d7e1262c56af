//! # Event subscribers for the effect runner.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used by the root runner to deliver [`Event`](crate::Event)s
//! broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! EffectRunner ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet::emit
//!                                                                     │
//!                                                          ┌──────────┼──────────┐
//!                                                          ▼          ▼          ▼
//!                                                      LogWriter   Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use effectvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct PauseCounter;
//!
//! #[async_trait]
//! impl Subscribe for PauseCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::EffectPaused {
//!             // increment a counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "pause-counter" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
