//! Dependency graph and version solver.
//!
//! [`PackageGraph`] turns a catalog snapshot into solver input with the
//! synthetic `frontend`/`framework` roots attached; [`solve`] computes a
//! one-version-per-name closure in activation order.

pub mod error;
pub mod graph;
pub mod solve;

pub use error::{Error, Result};
pub use graph::{
    DependencyEdge, FRAMEWORK, FRONTEND, GraphValidation, HostVersions, PackageGraph, PackageNode,
};
pub use solve::{Resolution, VersionPins, solve};
