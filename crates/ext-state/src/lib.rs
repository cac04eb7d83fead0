//! Copy-on-write activation state over a catalog and its package graph.

pub mod activation;
pub mod error;

pub use activation::ActivationState;
pub use error::{AutoActivateFailure, Error, Result};
