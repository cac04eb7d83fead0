//! Activation state machine.
//!
//! Three sets drive the lifecycle: installed (the whole catalog),
//! explicitly activated (user-chosen), and active (the explicit set plus
//! everything the solver pulls in). Every transition is copy-on-write:
//! operations take `&self` and return a fresh state, so a failed
//! transition can never leave a half-applied activation behind. The
//! caller decides persistence and propagation.

use std::sync::Arc;

use ext_catalog::{Catalog, Extension, ExtensionId};
use ext_solver::{HostVersions, PackageGraph, Resolution, VersionPins, solve};
use ext_version::VersionRange;

use crate::error::{AutoActivateFailure, Error, Result};

/// Immutable activation snapshot over one catalog.
#[derive(Debug, Clone)]
pub struct ActivationState {
    catalog: Arc<Catalog>,
    graph: Arc<PackageGraph>,
    explicit: Vec<ExtensionId>,
    active: Vec<ExtensionId>,
}

impl ActivationState {
    /// Fresh state with nothing activated.
    pub fn new(catalog: Catalog, host: &HostVersions) -> Result<Self> {
        let graph = PackageGraph::build(&catalog, host)?;
        Ok(Self {
            catalog: Arc::new(catalog),
            graph: Arc::new(graph),
            explicit: Vec::new(),
            active: Vec::new(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &PackageGraph {
        &self.graph
    }

    /// User-chosen extensions, in request order.
    pub fn explicit(&self) -> &[ExtensionId] {
        &self.explicit
    }

    /// The full active closure, dependencies first.
    pub fn active(&self) -> &[ExtensionId] {
        &self.active
    }

    /// Active extensions resolved to their catalog entries, in
    /// activation order. Feed this to the configuration merger.
    pub fn active_extensions(&self) -> Vec<&Extension> {
        self.active
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }

    pub fn is_active(&self, id: &ExtensionId) -> bool {
        self.active.contains(id)
    }

    /// Whether two snapshots derive from the same catalog. Callers
    /// should discard results computed against a stale catalog.
    pub fn same_catalog(&self, other: &ActivationState) -> bool {
        Arc::ptr_eq(&self.catalog, &other.catalog)
    }

    /// Add an extension to the explicit set and re-solve. Rejected
    /// transitions leave `self` untouched; already-explicit requests
    /// are no-ops.
    pub fn activate(&self, id: &ExtensionId) -> Result<Self> {
        if self.catalog.get(id).is_none() {
            return Err(Error::UnknownExtension { id: id.to_string() });
        }
        if self.explicit.contains(id) {
            return Ok(self.clone());
        }
        let mut explicit = self.explicit.clone();
        explicit.push(id.clone());
        let resolution = self.resolve(&explicit)?;
        tracing::debug!(extension = %id, active = resolution.order.len(), "activated");
        Ok(self.with(explicit, resolution))
    }

    /// Remove an extension from the explicit set. Fails with
    /// [`Error::StillRequired`] when the remaining explicit extensions
    /// still pull it in (or when it was never explicit but is active as
    /// a dependency).
    pub fn deactivate(&self, id: &ExtensionId) -> Result<Self> {
        if self.catalog.get(id).is_none() {
            return Err(Error::UnknownExtension { id: id.to_string() });
        }
        if !self.is_active(id) {
            return Err(Error::NotActive { id: id.to_string() });
        }
        let explicit: Vec<ExtensionId> = self
            .explicit
            .iter()
            .filter(|e| *e != id)
            .cloned()
            .collect();
        let resolution = self.resolve(&explicit)?;
        if resolution.contains_name(&id.name) {
            let required_by = self
                .graph
                .reverse_dependencies_of(id)?
                .into_iter()
                .filter(|dependent| resolution.order.contains(dependent))
                .map(|dependent| dependent.to_string())
                .collect();
            return Err(Error::StillRequired {
                extension: id.to_string(),
                required_by,
            });
        }
        tracing::debug!(extension = %id, "deactivated");
        Ok(self.with(explicit, resolution))
    }

    /// Greedy auto-activation over the whole catalog, one name at a
    /// time in discovery order, newest version of each. Run once per
    /// fresh installation.
    pub fn first_time_use(&self) -> Result<Self> {
        let names: Vec<String> = self.catalog.names().iter().map(|n| n.to_string()).collect();
        self.auto_activate(&names)
    }

    /// Greedy auto-activation over an ordered candidate list.
    ///
    /// Each candidate is added to the explicit set and kept only if the
    /// closure still resolves. A candidate that merely conflicts with
    /// earlier picks is skipped; a candidate that does not resolve even
    /// on its own marks the catalog as broken and is collected into the
    /// aggregate [`Error::AutoActivate`].
    pub fn auto_activate<S: AsRef<str>>(&self, candidates: &[S]) -> Result<Self> {
        let mut state = self.clone();
        let mut failures = Vec::new();

        for name in candidates {
            let name = name.as_ref();
            let Some(version) = self.catalog.versions_of(name).into_iter().next() else {
                continue;
            };
            let id = ExtensionId::new(name, version);
            match state.activate(&id) {
                Ok(next) => state = next,
                Err(err) => {
                    // Distinguish a pick conflicting with earlier picks
                    // from one the catalog can never satisfy.
                    match self.resolve(std::slice::from_ref(&id)) {
                        Ok(_) => {
                            tracing::debug!(extension = %id, %err, "skipped: conflicts with earlier picks");
                        }
                        Err(alone) => {
                            tracing::warn!(extension = %id, %alone, "auto-activation failed");
                            failures.push(AutoActivateFailure {
                                id,
                                details: Vec::new(),
                            });
                        }
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::AutoActivate { failures });
        }
        Ok(state)
    }

    /// The explicit set as persistable `name == version` entries.
    pub fn load_order(&self) -> Vec<String> {
        self.explicit
            .iter()
            .map(|id| format!("{} == {}", id.name, id.version))
            .collect()
    }

    /// Replay a persisted load order. Entries are `name == version`;
    /// anything but an exact pin is rejected, and each activation is
    /// applied in sequence under the normal rules.
    pub fn restore_load_order<S: AsRef<str>>(&self, entries: &[S]) -> Result<Self> {
        let mut state = self.clone();
        for entry in entries {
            let entry = entry.as_ref();
            let Some((name, pin)) = entry.split_once("==") else {
                return Err(Error::MalformedLoadEntry {
                    entry: entry.to_string(),
                });
            };
            let range = VersionRange::parse_pinned(&format!("=={}", pin.trim()))?;
            let Some(version) = range.as_exact() else {
                return Err(Error::MalformedLoadEntry {
                    entry: entry.to_string(),
                });
            };
            state = state.activate(&ExtensionId::new(name.trim(), version.clone()))?;
        }
        Ok(state)
    }

    fn resolve(&self, explicit: &[ExtensionId]) -> Result<Resolution> {
        Ok(solve(&self.graph, explicit, &VersionPins::new())?)
    }

    fn with(&self, explicit: Vec<ExtensionId>, resolution: Resolution) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            graph: Arc::clone(&self.graph),
            explicit,
            active: resolution.order,
        }
    }
}
