//! Configuration demand merging and validation.
//!
//! Consumes the activation order plus each extension's declared demands
//! and produces one merged overlay per option URL, with provenance and
//! structured diagnostics, ready for rendering as editable controls.

pub mod diagnostics;
pub mod merge;
pub mod validate;

pub use diagnostics::{ConfigConflict, DanglingDemand};
pub use merge::{
    EffectiveConstraints, MergedConfiguration, MergedEntry, Qualifier, USER, UserOverlay, merge,
};
pub use validate::{Validation, validate};
