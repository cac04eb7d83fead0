//! Declaration parsing — the discovery boundary.
//!
//! The external discovery process hands the engine one YAML document per
//! extension (the contents of its `definition.yml`, plus the optional
//! `options` and `config-sparse` sections). Everything malformed is
//! rejected here with a structured error; the core never sees a
//! half-parsed descriptor.
//!
//! The sparse config section is a nested tree whose leaves are objects
//! carrying a `contents` key; nested segments fold into dotted URLs:
//!
//! ```yaml
//! name: ucp2-aic-patch
//! version: 2.15.1
//! type: plugin
//! dependencies:
//!   ucp2-ai-files: "^2.15.1"
//! config-sparse:
//!   modules:
//!     aiSwapper:
//!       config:
//!         menu:
//!           contents:
//!             suggested-value: ...
//! ```
//!
//! yields one demand on `aiSwapper.menu`.

use std::collections::BTreeMap;

use ext_version::VersionRange;
use semver::Version;
use serde::Deserialize;

use crate::demand::{ConfigDemand, DemandContents};
use crate::error::{Error, Result};
use crate::extension::{Extension, ExtensionKind};
use crate::option::OptionSpec;

#[derive(Debug, Deserialize)]
struct RawDeclaration {
    name: String,
    version: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "display-name", default)]
    display_name: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    options: Vec<OptionSpec>,
    #[serde(rename = "config-sparse", default)]
    config_sparse: Option<RawSparseConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSparseConfig {
    #[serde(default)]
    modules: BTreeMap<String, RawConfigTarget>,
    #[serde(default)]
    plugins: BTreeMap<String, RawConfigTarget>,
}

#[derive(Debug, Deserialize)]
struct RawConfigTarget {
    #[serde(default)]
    config: serde_yaml::Value,
}

/// Parse one extension declaration document.
pub fn parse_declaration(document: &str) -> Result<Extension> {
    let raw: RawDeclaration = serde_yaml::from_str(document)?;

    validate_name(&raw.name)?;

    let version = Version::parse(&raw.version).map_err(|source| Error::InvalidVersion {
        name: raw.name.clone(),
        version: raw.version.clone(),
        source,
    })?;

    let kind = match raw.kind.as_str() {
        "module" => ExtensionKind::Module,
        "plugin" => ExtensionKind::Plugin,
        other => {
            return Err(Error::InvalidKind {
                name: raw.name.clone(),
                value: other.to_string(),
            });
        }
    };

    let mut dependencies = BTreeMap::new();
    for (dep_name, range_str) in raw.dependencies {
        let range = VersionRange::parse(&range_str).map_err(|source| Error::InvalidRange {
            name: raw.name.clone(),
            dependency: dep_name.clone(),
            source,
        })?;
        dependencies.insert(dep_name, range);
    }

    let mut demands = Vec::new();
    if let Some(sparse) = raw.config_sparse {
        for (target, entry) in sparse.modules.into_iter().chain(sparse.plugins) {
            collect_config_entries(&entry.config, &target, &mut demands)?;
        }
    } else {
        tracing::debug!(
            extension = %raw.name,
            "declaration carries no sparse config section"
        );
    }

    Ok(Extension {
        display_name: raw.display_name.unwrap_or_else(|| raw.name.clone()),
        name: raw.name,
        version,
        kind,
        dependencies,
        option_specs: raw.options,
        demands,
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "extension name must not be empty".to_string(),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "extension name must contain only alphanumeric characters, hyphens, or underscores"
                .to_string(),
        });
    }
    Ok(())
}

/// Fold a nested sparse-config tree into flat demands, treating any
/// mapping with a `contents` key as a leaf.
fn collect_config_entries(
    value: &serde_yaml::Value,
    url: &str,
    demands: &mut Vec<ConfigDemand>,
) -> Result<()> {
    let serde_yaml::Value::Mapping(map) = value else {
        return Ok(());
    };

    if let Some(contents) = map.get("contents") {
        if demands.iter().any(|d| d.url == url) {
            return Err(Error::DuplicateDemandUrl {
                url: url.to_string(),
            });
        }
        let contents: DemandContents = serde_yaml::from_value(contents.clone())?;
        demands.push(ConfigDemand {
            url: url.to_string(),
            contents,
        });
        return Ok(());
    }

    for (key, child) in map {
        let Some(segment) = key.as_str() else {
            continue;
        };
        let child_url = format!("{url}.{segment}");
        collect_config_entries(child, &child_url, demands)?;
    }
    Ok(())
}
