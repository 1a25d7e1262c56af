//! # Runner configuration.
//!
//! Provides [`RunnerConfig`], the settings shared by a root runner and every
//! child scope created from it.
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown cancels workers without waiting for them
//! - `bus_capacity = 0` / `input_capacity = 0` → clamped to 1

use std::time::Duration;

/// Configuration of a root [`EffectRunner`](crate::EffectRunner).
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `input_capacity`: per-effect iteration queue size (min 1)
/// - `grace`: maximum wait for effect workers on [`shutdown`](crate::EffectRunner::shutdown)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking sentinels
/// in place.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Capacity of the event bus broadcast channel.
    ///
    /// Subscribers lagging behind more than `bus_capacity` events skip the
    /// oldest ones.
    pub bus_capacity: usize,

    /// Capacity of each running effect's iteration queue.
    ///
    /// An effect that falls this far behind the host store misses iterations;
    /// every miss is reported as `IterationDropped`.
    pub input_capacity: usize,

    /// Maximum time `shutdown` waits for effect workers to exit.
    pub grace: Duration,
}

impl RunnerConfig {
    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Input queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn input_capacity_clamped(&self) -> usize {
        self.input_capacity.max(1)
    }

    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait for workers
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `input_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            input_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}
