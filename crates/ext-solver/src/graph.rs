//! Package graph construction.
//!
//! Every catalog entry becomes one node; edges point from a dependent to
//! each of its dependencies, labeled with the required range. Two
//! permanent synthetic nodes, `frontend` and `framework`, carry the host
//! application's own versions so extensions can depend on them; they are
//! never part of any solver output. Building is pure and deterministic:
//! identical catalogs always produce structurally identical graphs.

use std::collections::{BTreeMap, HashMap};

use ext_catalog::{Catalog, Extension, ExtensionId};
use ext_version::VersionRange;
use semver::Version;

use crate::error::{Error, Result};

/// Synthetic root representing the GUI.
pub const FRONTEND: &str = "frontend";
/// Synthetic root representing the patching framework.
pub const FRAMEWORK: &str = "framework";

/// Version pins for the two synthetic roots.
#[derive(Debug, Clone)]
pub struct HostVersions {
    pub frontend: Version,
    pub framework: Version,
}

impl Default for HostVersions {
    fn default() -> Self {
        Self {
            frontend: Version::new(1, 0, 0),
            framework: Version::new(3, 0, 0),
        }
    }
}

/// One dependency edge: the required name and range.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub name: String,
    pub range: VersionRange,
}

/// One solver vertex wrapping an extension version (or a synthetic root).
#[derive(Debug, Clone)]
pub struct PackageNode {
    pub id: ExtensionId,
    pub edges: Vec<DependencyEdge>,
    pub synthetic: bool,
}

/// Result of the advisory whole-graph validation run at catalog-load
/// time. Unsatisfiable edges are reported as messages, not errors.
#[derive(Debug, Clone)]
pub struct GraphValidation {
    pub messages: Vec<String>,
}

impl GraphValidation {
    pub fn is_ok(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The dependency graph over one catalog snapshot.
#[derive(Debug, Clone)]
pub struct PackageGraph {
    nodes: Vec<PackageNode>,
    /// Node indices per name, newest version first.
    by_name: BTreeMap<String, Vec<usize>>,
    by_id: HashMap<String, usize>,
}

impl PackageGraph {
    /// Build the graph for a catalog plus the host's synthetic roots.
    pub fn build(catalog: &Catalog, host: &HostVersions) -> Result<Self> {
        let mut nodes: Vec<PackageNode> = Vec::with_capacity(catalog.len() + 2);

        for ext in catalog.iter() {
            if ext.name == FRONTEND || ext.name == FRAMEWORK {
                return Err(Error::ReservedName {
                    name: ext.name.clone(),
                });
            }
            nodes.push(node_for(ext));
        }

        nodes.push(PackageNode {
            id: ExtensionId::new(FRONTEND, host.frontend.clone()),
            edges: Vec::new(),
            synthetic: true,
        });
        nodes.push(PackageNode {
            id: ExtensionId::new(FRAMEWORK, host.framework.clone()),
            edges: Vec::new(),
            synthetic: true,
        });

        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            by_name.entry(node.id.name.clone()).or_default().push(index);
            by_id.insert(node.id.to_string(), index);
        }
        for indices in by_name.values_mut() {
            indices.sort_by(|&a, &b| nodes[b].id.version.cmp(&nodes[a].id.version));
        }

        tracing::debug!(nodes = nodes.len(), "package graph built");
        Ok(Self {
            nodes,
            by_name,
            by_id,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, index: usize) -> &PackageNode {
        &self.nodes[index]
    }

    pub(crate) fn index_of(&self, id: &ExtensionId) -> Option<usize> {
        self.by_id.get(&id.to_string()).copied()
    }

    /// Node indices for a name, newest version first.
    pub(crate) fn indices_of(&self, name: &str) -> &[usize] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All versions present for a name, newest first.
    pub fn versions_of(&self, name: &str) -> Vec<Version> {
        self.indices_of(name)
            .iter()
            .map(|&i| self.nodes[i].id.version.clone())
            .collect()
    }

    /// Validate that every edge in the graph is satisfiable by some
    /// present version, one edge at a time. Advisory: failing edges are
    /// enumerated as human-readable messages.
    pub fn validate_all(&self) -> GraphValidation {
        let mut messages = Vec::new();
        for node in &self.nodes {
            for edge in &node.edges {
                let found = self.versions_of(&edge.name);
                let satisfied = found.iter().any(|v| edge.range.matches(v));
                if !satisfied {
                    messages.push(unsatisfiable_message(&node.id, edge, &found));
                }
            }
        }
        if !messages.is_empty() {
            tracing::warn!(count = messages.len(), "graph has unsatisfiable edges");
        }
        GraphValidation { messages }
    }

    /// Immediate dependencies of a node, resolved to the newest matching
    /// version of each name; synthetic roots excluded.
    pub fn direct_dependencies_of(&self, id: &ExtensionId) -> Result<Vec<ExtensionId>> {
        let index = self.index_of(id).ok_or_else(|| Error::UnknownNode {
            id: id.to_string(),
        })?;
        let mut result = Vec::new();
        for edge in &self.nodes[index].edges {
            let Some(&target) = self
                .indices_of(&edge.name)
                .iter()
                .find(|&&i| edge.range.matches(&self.nodes[i].id.version))
            else {
                continue;
            };
            if !self.nodes[target].synthetic {
                result.push(self.nodes[target].id.clone());
            }
        }
        Ok(result)
    }

    /// Nodes whose dependency ranges admit this node; synthetic roots
    /// excluded. Used to explain why an extension cannot be removed.
    pub fn reverse_dependencies_of(&self, id: &ExtensionId) -> Result<Vec<ExtensionId>> {
        if self.index_of(id).is_none() {
            return Err(Error::UnknownNode {
                id: id.to_string(),
            });
        }
        Ok(self
            .nodes
            .iter()
            .filter(|node| !node.synthetic)
            .filter(|node| {
                node.edges
                    .iter()
                    .any(|e| e.name == id.name && e.range.matches(&id.version))
            })
            .map(|node| node.id.clone())
            .collect())
    }
}

fn node_for(ext: &Extension) -> PackageNode {
    PackageNode {
        id: ext.id(),
        edges: ext
            .dependencies
            .iter()
            .map(|(name, range)| DependencyEdge {
                name: name.clone(),
                range: range.clone(),
            })
            .collect(),
        synthetic: false,
    }
}

pub(crate) fn unsatisfiable_message(
    dependent: &ExtensionId,
    edge: &DependencyEdge,
    found: &[Version],
) -> String {
    let found = if found.is_empty() {
        "(none)".to_string()
    } else {
        found
            .iter()
            .map(Version::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{dependent} requires {} {} but found versions: {found}",
        edge.name, edge.range
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ext_catalog::ExtensionKind;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap as Map;

    fn ext(name: &str, version: &str, deps: &[(&str, &str)]) -> Extension {
        Extension {
            name: name.to_string(),
            version: Version::parse(version).unwrap(),
            kind: ExtensionKind::Module,
            display_name: name.to_string(),
            dependencies: deps
                .iter()
                .map(|(n, r)| (n.to_string(), VersionRange::parse(r).unwrap()))
                .collect::<Map<_, _>>(),
            option_specs: Vec::new(),
            demands: Vec::new(),
        }
    }

    fn graph(extensions: Vec<Extension>) -> PackageGraph {
        let catalog = Catalog::new(extensions).unwrap();
        PackageGraph::build(&catalog, &HostVersions::default()).unwrap()
    }

    #[test]
    fn test_synthetic_roots_present() {
        let g = graph(vec![ext("files", "1.1.0", &[])]);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.versions_of(FRONTEND), vec![Version::new(1, 0, 0)]);
        assert_eq!(g.versions_of(FRAMEWORK), vec![Version::new(3, 0, 0)]);
    }

    #[test]
    fn test_reserved_names_rejected() {
        let catalog = Catalog::new(vec![ext("frontend", "9.0.0", &[])]).unwrap();
        let err = PackageGraph::build(&catalog, &HostVersions::default()).unwrap_err();
        assert!(matches!(err, Error::ReservedName { .. }));
    }

    #[test]
    fn test_validate_all_ok() {
        let g = graph(vec![
            ext("files", "1.1.0", &[]),
            ext("aivloader", "1.0.0", &[("files", ">= 0.0.1")]),
        ]);
        assert!(g.validate_all().is_ok());
    }

    #[test]
    fn test_validate_all_reports_missing_dependency() {
        let g = graph(vec![ext("aivloader", "1.0.0", &[("files", ">= 0.0.1")])]);
        let validation = g.validate_all();
        assert!(!validation.is_ok());
        assert_eq!(validation.messages.len(), 1);
        assert!(validation.messages[0].contains("aivloader@1.0.0"));
        assert!(validation.messages[0].contains("files"));
        assert!(validation.messages[0].contains("(none)"));
    }

    #[test]
    fn test_validate_all_reports_wrong_version() {
        let g = graph(vec![
            ext("files", "0.1.0", &[]),
            ext("maploader", "1.0.0", &[("files", ">= 0.2.0")]),
        ]);
        let validation = g.validate_all();
        assert_eq!(validation.messages.len(), 1);
        assert!(validation.messages[0].contains("0.1.0"));
    }

    #[test]
    fn test_direct_dependencies_exclude_roots() {
        let g = graph(vec![
            ext("files", "1.1.0", &[]),
            ext(
                "plugin-a",
                "1.0.0",
                &[("files", ">= 0.1.0"), ("framework", "^3.0.0")],
            ),
        ]);
        let deps = g
            .direct_dependencies_of(&ExtensionId::new("plugin-a", Version::new(1, 0, 0)))
            .unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].to_string(), "files@1.1.0");
    }

    #[test]
    fn test_direct_dependencies_pick_newest_match() {
        let g = graph(vec![
            ext("files", "0.2.0", &[]),
            ext("files", "1.1.0", &[]),
            ext("aivloader", "1.0.0", &[("files", ">= 0.0.1")]),
        ]);
        let deps = g
            .direct_dependencies_of(&ExtensionId::new("aivloader", Version::new(1, 0, 0)))
            .unwrap();
        assert_eq!(deps[0].version, Version::new(1, 1, 0));
    }

    #[test]
    fn test_reverse_dependencies() {
        let g = graph(vec![
            ext("files", "1.1.0", &[]),
            ext("aivloader", "1.0.0", &[("files", ">= 0.0.1")]),
            ext("maploader", "1.0.0", &[("files", ">= 0.2.0")]),
        ]);
        let reverse = g
            .reverse_dependencies_of(&ExtensionId::new("files", Version::new(1, 1, 0)))
            .unwrap();
        let names: Vec<_> = reverse.iter().map(|id| id.name.as_str()).collect();
        assert!(names.contains(&"aivloader"));
        assert!(names.contains(&"maploader"));
    }

    #[test]
    fn test_unknown_node_errors() {
        let g = graph(vec![ext("files", "1.1.0", &[])]);
        let err = g
            .direct_dependencies_of(&ExtensionId::new("ghost", Version::new(1, 0, 0)))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNode { .. }));
    }
}
