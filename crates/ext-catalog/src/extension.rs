//! Extension descriptors.
//!
//! An extension is a named, versioned unit (module or plugin) that
//! declares dependencies on other extensions, owns option
//! specifications, and places configuration demands on options (its own
//! or another extension's). Descriptors are produced by an external
//! discovery process and never mutated afterwards.

use std::collections::BTreeMap;

use ext_version::VersionRange;
use semver::Version;

use crate::demand::ConfigDemand;
use crate::option::OptionSpec;

/// The kind of extension, inferred from where it was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Module,
    Plugin,
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => f.write_str("module"),
            Self::Plugin => f.write_str("plugin"),
        }
    }
}

/// Identity of one extension version: unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId {
    pub name: String,
    pub version: Version,
}

impl ExtensionId {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl std::fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// One discovered extension version.
#[derive(Debug, Clone)]
pub struct Extension {
    pub name: String,
    pub version: Version,
    pub kind: ExtensionKind,
    /// Human-readable name from the declaration, falling back to `name`.
    pub display_name: String,
    /// Dependency map: extension name to required range.
    pub dependencies: BTreeMap<String, VersionRange>,
    /// Option specifications this extension owns.
    pub option_specs: Vec<OptionSpec>,
    /// Configuration demands this extension places while active.
    pub demands: Vec<ConfigDemand>,
}

impl Extension {
    pub fn id(&self) -> ExtensionId {
        ExtensionId::new(self.name.clone(), self.version.clone())
    }
}
