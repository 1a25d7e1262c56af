//! Error types used by the effect runner.
//!
//! This module defines three error enums:
//!
//! - [`LifecycleError`]: a `run`/`pause`/`stop` call was rejected.
//! - [`ResolveError`]: the resolver could not materialize a definition.
//! - [`RuntimeError`]: errors raised by the runner itself (graceful shutdown).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! None of them is retried automatically: they signal caller-side logic errors
//! (double run, double pause) rather than transient conditions.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by lifecycle calls.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `run` on an effect that is already connected to the stream.
    #[error("effect '{effect}' is already running")]
    AlreadyRunning {
        /// Effect name.
        effect: Arc<str>,
    },

    /// `pause` (or `stop`) on an effect that is resolved but paused.
    #[error("effect '{effect}' cannot be paused: effect is already paused")]
    NotRunning {
        /// Effect name.
        effect: Arc<str>,
    },

    /// `pause`/`stop` on a definition that was never resolved (or was stopped).
    #[error("effect '{effect}' is not running and has not been resolved")]
    NotResolved {
        /// Definition name.
        effect: Arc<str>,
    },

    /// The resolver failed; nothing was cached.
    #[error("failed to resolve effect '{effect}': {source}")]
    Resolution {
        /// Definition name.
        effect: Arc<str>,
        /// Underlying resolver error.
        #[source]
        source: ResolveError,
    },
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use effectvisor::LifecycleError;
    ///
    /// let err = LifecycleError::AlreadyRunning { effect: "watcher".into() };
    /// assert_eq!(err.as_label(), "effect_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::AlreadyRunning { .. } => "effect_already_running",
            LifecycleError::NotRunning { .. } => "effect_not_running",
            LifecycleError::NotResolved { .. } => "effect_not_resolved",
            LifecycleError::Resolution { .. } => "effect_resolution_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LifecycleError::AlreadyRunning { effect } => format!("already running: {effect}"),
            LifecycleError::NotRunning { effect } => format!("already paused: {effect}"),
            LifecycleError::NotResolved { effect } => format!("not resolved: {effect}"),
            LifecycleError::Resolution { effect, source } => {
                format!("resolution of {effect} failed: {}", source.as_message())
            }
        }
    }

    /// Name of the effect the rejected call was about.
    pub fn effect(&self) -> &str {
        match self {
            LifecycleError::AlreadyRunning { effect }
            | LifecycleError::NotRunning { effect }
            | LifecycleError::NotResolved { effect }
            | LifecycleError::Resolution { effect, .. } => effect,
        }
    }
}

/// # Errors produced while materializing a definition.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A dependency requested by the factory is not provided by the injector chain.
    #[error("no provider for dependency {type_name}")]
    MissingDependency {
        /// `std::any::type_name` of the requested dependency.
        type_name: &'static str,
    },

    /// The factory itself reported an error.
    #[error("factory failed: {reason}")]
    Factory {
        /// The underlying error message.
        reason: String,
    },
}

impl ResolveError {
    /// Convenience constructor for [`ResolveError::Factory`].
    pub fn factory(reason: impl Into<String>) -> Self {
        ResolveError::Factory {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolveError::MissingDependency { .. } => "resolve_missing_dependency",
            ResolveError::Factory { .. } => "resolve_factory_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ResolveError::MissingDependency { type_name } => format!("missing: {type_name}"),
            ResolveError::Factory { reason } => format!("factory: {reason}"),
        }
    }
}

/// # Errors produced by the runner itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some effect workers were still draining.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the effects whose workers did not finish in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use effectvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck effects={stuck:?}")
            }
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_keeps_source() {
        let err = LifecycleError::Resolution {
            effect: "loader".into(),
            source: ResolveError::MissingDependency { type_name: "Api" },
        };
        assert_eq!(err.as_label(), "effect_resolution_failed");
        assert_eq!(err.effect(), "loader");
        assert_eq!(
            err.to_string(),
            "failed to resolve effect 'loader': no provider for dependency Api"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn panic_message_handles_both_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*s), "static");
        assert_eq!(panic_message(&*owned), "owned");
        assert_eq!(panic_message(&*other), "unknown panic");
    }
}
