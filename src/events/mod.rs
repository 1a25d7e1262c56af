//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the root runner, the
//! iteration stream workers and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EffectRunner` (lifecycle), `IterationStream` (dropped
//!   iterations), stream workers (completion/panic), `SubscriberSet` workers.
//! - **Consumers**: the root runner's subscriber listener (fans out to
//!   `SubscriberSet`) and anyone holding [`EffectRunner::bus`](crate::EffectRunner::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
