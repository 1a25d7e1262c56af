//! # Effect abstractions and definitions.
//!
//! This module provides the effect-related types:
//! - [`Iteration`] - one `(state, action)` pair from the host store
//! - [`Effect`] - trait for stream transformers from iterations to actions
//! - [`EffectFn`] - function-backed effect implementation
//! - [`EffectRef`] - shared reference to an effect (`Arc<dyn Effect>`)
//! - [`Definition`] - identity-compared recipe the runner resolves on `run`
//! - [`Resolve`], [`Injector`] - resolver capability and its reference implementation

mod definition;
mod effect;
mod effect_fn;
mod iteration;
mod resolver;

pub use definition::{Definition, DefinitionId};
pub use effect::{Actions, Effect, EffectRef, Iterations};
pub use effect_fn::EffectFn;
pub use iteration::Iteration;
pub use resolver::{Injector, Resolve};
