//! # Subscribe: observing runner events
//!
//! Implement [`Subscribe`] to receive every [`Event`] published on the root
//! bus. Each implementation gets its own lane (see
//! [`SubscriberSet`](crate::SubscriberSet)), so a slow `on_event` only delays
//! that subscriber. When its lane fills up, further events are discarded for
//! it and reported as `SubscriberOverflow`.

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of runner events.
///
/// `on_event` runs on the subscriber's lane task; avoid blocking calls in it.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    /// Label used in overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Lane size; values below one are raised to one.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
