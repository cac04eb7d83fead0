//! Data model for the extension engine.
//!
//! This crate provides the extension descriptor, option specifications,
//! configuration demands, the catalog with duplicate detection, and the
//! declaration parser that guards the discovery boundary.

pub mod catalog;
pub mod declaration;
pub mod demand;
pub mod error;
pub mod extension;
pub mod option;

pub use catalog::{Catalog, OwnedOptionSpec, namespaced_url};
pub use declaration::parse_declaration;
pub use demand::{ConfigDemand, DemandContents};
pub use error::{Error, Result};
pub use extension::{Extension, ExtensionId, ExtensionKind};
pub use option::{NumericRange, OptionSpec, OptionType};
