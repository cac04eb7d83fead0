//! The extension catalog.
//!
//! Holds every discovered extension version in discovery order. Identity
//! `(name, version)` is unique; a duplicate is a hard error surfaced to
//! the caller, not swallowed.

use std::collections::{BTreeMap, HashMap, HashSet};

use ext_version::sort_newest_first;
use semver::Version;

use crate::error::{Error, Result};
use crate::extension::{Extension, ExtensionId};
use crate::option::OptionSpec;

/// An option spec together with the extension that owns it.
#[derive(Debug, Clone)]
pub struct OwnedOptionSpec {
    pub spec: OptionSpec,
    pub owner: ExtensionId,
}

/// Immutable catalog of discovered extensions.
#[derive(Debug, Clone)]
pub struct Catalog {
    extensions: Vec<Extension>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate `(name, version)` pairs.
    pub fn new(extensions: Vec<Extension>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(extensions.len());
        for (index, ext) in extensions.iter().enumerate() {
            let id = ext.id().to_string();
            if by_id.insert(id.clone(), index).is_some() {
                return Err(Error::DuplicateExtension {
                    name: ext.name.clone(),
                    version: ext.version.to_string(),
                });
            }
        }
        tracing::debug!(count = extensions.len(), "catalog built");
        Ok(Self { extensions, by_id })
    }

    /// Extensions in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Look up one extension version.
    pub fn get(&self, id: &ExtensionId) -> Option<&Extension> {
        self.by_id.get(&id.to_string()).map(|&i| &self.extensions[i])
    }

    /// Look up by `name@version` string.
    pub fn get_by_str(&self, id: &str) -> Option<&Extension> {
        self.by_id.get(id).map(|&i| &self.extensions[i])
    }

    /// Position of an extension in discovery order. Used as the
    /// deterministic tie-breaker for topological sorting.
    pub fn position(&self, id: &ExtensionId) -> Option<usize> {
        self.by_id.get(&id.to_string()).copied()
    }

    /// All versions present for a name, newest first.
    pub fn versions_of(&self, name: &str) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .extensions
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.version.clone())
            .collect();
        sort_newest_first(&mut versions);
        versions
    }

    /// All distinct extension names, in discovery order.
    pub fn names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.extensions
            .iter()
            .filter(|e| seen.insert(e.name.as_str()))
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Index of every declared option spec by namespaced URL.
    ///
    /// URLs not already prefixed with the owning extension's name are
    /// namespaced here. Options are owned by exactly one extension
    /// name: when several versions of that name re-declare a URL the
    /// newest version's declaration wins, while a URL declared twice by
    /// one version is a hard error.
    pub fn option_specs(&self) -> Result<BTreeMap<String, OwnedOptionSpec>> {
        let mut index: BTreeMap<String, OwnedOptionSpec> = BTreeMap::new();
        for ext in &self.extensions {
            for spec in &ext.option_specs {
                let url = namespaced_url(&ext.name, &spec.url);
                if let Some(existing) = index.get(&url) {
                    let same_name = existing.owner.name == ext.name;
                    if !same_name || existing.owner.version == ext.version {
                        return Err(Error::DuplicateOptionUrl {
                            url,
                            owner: existing.owner.to_string(),
                            other: ext.id().to_string(),
                        });
                    }
                    if existing.owner.version > ext.version {
                        continue;
                    }
                }
                index.insert(
                    url.clone(),
                    OwnedOptionSpec {
                        spec: OptionSpec {
                            url,
                            ..spec.clone()
                        },
                        owner: ext.id(),
                    },
                );
            }
        }
        Ok(index)
    }
}

/// Prefix a URL with the owning extension name when the prefix is
/// missing, like the original discovery step does.
pub fn namespaced_url(extension_name: &str, url: &str) -> String {
    let prefix = format!("{extension_name}.");
    if url.starts_with(&prefix) {
        url.to_string()
    } else {
        format!("{prefix}{url}")
    }
}
