//! Version range engine for the extension system.
//!
//! Every other crate in the workspace reasons about dependency ranges
//! through this one. Concrete versions are [`semver::Version`]; ranges
//! are the four forms the declaration format supports (`==`, `>=`, `^`,
//! `*`), parsed into [`VersionRange`].

pub mod error;
pub mod range;

pub use error::{Error, Result};
pub use range::{VersionRange, sort_newest_first};
