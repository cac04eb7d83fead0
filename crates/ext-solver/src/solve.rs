//! Closure solving: one version per name.
//!
//! Given target nodes, [`solve`] computes the minimal set of packages
//! reachable through dependency edges, picking for each distinct name
//! the single version compatible with every range constraining it from
//! within the closure. The domain never needs full cross-version
//! backtracking: when a new constraint arrives the solver re-picks that
//! name's version and iterates to a fixpoint. Ties prefer the highest
//! version unless a caller-supplied pin overrides the choice.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use ext_catalog::ExtensionId;
use semver::Version;

use crate::error::{Error, Result};
use crate::graph::{DependencyEdge, PackageGraph, unsatisfiable_message};

/// A successful solve: the resolved closure in activation order
/// (dependencies first), synthetic roots excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub order: Vec<ExtensionId>,
}

impl Resolution {
    pub fn contains_name(&self, name: &str) -> bool {
        self.order.iter().any(|id| id.name == name)
    }
}

/// Caller-supplied version preferences, keyed by extension name.
pub type VersionPins = BTreeMap<String, Version>;

/// Resolve the closure of `targets`.
pub fn solve(
    graph: &PackageGraph,
    targets: &[ExtensionId],
    pins: &VersionPins,
) -> Result<Resolution> {
    // Target versions are fixed by the caller.
    let mut chosen: BTreeMap<String, Version> = BTreeMap::new();
    for target in targets {
        if graph.index_of(target).is_none() {
            return Err(Error::UnknownNode {
                id: target.to_string(),
            });
        }
        chosen.insert(target.name.clone(), target.version.clone());
    }
    let fixed: BTreeSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();

    // Re-pick versions until the closure is stable. The cap guards
    // against oscillation between equally constrained picks; graphs are
    // tens to low hundreds of nodes, so the bound is generous.
    let max_rounds = graph.node_count() * graph.node_count() + 1;
    for _ in 0..max_rounds {
        let constraints = collect_constraints(graph, targets, &chosen);

        let mut changed = false;
        for (name, edges) in &constraints {
            let candidates = candidate_versions(graph, name, pins);
            let best = candidates
                .iter()
                .find(|v| edges.iter().all(|(_, edge)| edge.range.matches(v)));

            let Some(best) = best else {
                return Err(unsatisfiable(graph, name, edges));
            };

            if fixed.contains(name.as_str()) {
                // The caller picked this exact version; every range in
                // the closure must admit it.
                let version = &chosen[name];
                if let Some((dependent, edge)) =
                    edges.iter().find(|(_, edge)| !edge.range.matches(version))
                {
                    return Err(Error::Unsatisfiable {
                        name: name.clone(),
                        trace: vec![unsatisfiable_message(
                            dependent,
                            edge,
                            &graph.versions_of(name),
                        )],
                    });
                }
                continue;
            }

            if chosen.get(name) != Some(best) {
                chosen.insert(name.clone(), best.clone());
                changed = true;
            }
        }

        // Drop names that fell out of the closure after a re-pick.
        chosen.retain(|name, _| {
            fixed.contains(name.as_str()) || constraints.contains_key(name)
        });

        if !changed {
            let order = topological_order(graph, &chosen)?;
            tracing::debug!(targets = targets.len(), resolved = order.len(), "solve ok");
            return Ok(Resolution { order });
        }
    }

    Err(Error::Unsatisfiable {
        name: targets
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_default(),
        trace: vec!["solver did not converge on a stable version assignment".to_string()],
    })
}

/// Walk the chosen closure from the targets, recording every range that
/// constrains each name. Only nodes reachable from the targets
/// contribute constraints.
fn collect_constraints<'g>(
    graph: &'g PackageGraph,
    targets: &[ExtensionId],
    chosen: &BTreeMap<String, Version>,
) -> BTreeMap<String, Vec<(ExtensionId, &'g DependencyEdge)>> {
    let mut constraints: BTreeMap<String, Vec<(ExtensionId, &DependencyEdge)>> = BTreeMap::new();
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for target in targets {
        if visited.insert(target.name.as_str()) {
            queue.push_back(target.name.as_str());
        }
    }

    while let Some(name) = queue.pop_front() {
        let Some(version) = chosen.get(name) else {
            continue;
        };
        let id = ExtensionId::new(name, version.clone());
        let Some(index) = graph.index_of(&id) else {
            continue;
        };
        for edge in &graph.node(index).edges {
            constraints
                .entry(edge.name.clone())
                .or_default()
                .push((id.clone(), edge));
            if !visited.contains(edge.name.as_str()) {
                // Borrow the name from the graph so it outlives the loop.
                if let Some(&dep_index) = graph.indices_of(&edge.name).first() {
                    let dep_name = graph.node(dep_index).id.name.as_str();
                    visited.insert(dep_name);
                    queue.push_back(dep_name);
                }
            }
        }
    }

    constraints
}

fn candidate_versions(graph: &PackageGraph, name: &str, pins: &VersionPins) -> Vec<Version> {
    let all = graph.versions_of(name);
    match pins.get(name) {
        Some(pin) if all.contains(pin) => vec![pin.clone()],
        Some(pin) => {
            tracing::warn!(package = name, pin = %pin, "pinned version not in catalog, ignoring pin");
            all
        }
        None => all,
    }
}

fn unsatisfiable(
    graph: &PackageGraph,
    name: &str,
    edges: &[(ExtensionId, &DependencyEdge)],
) -> Error {
    let found = graph.versions_of(name);
    let trace = edges
        .iter()
        .map(|(dependent, edge)| unsatisfiable_message(dependent, edge, &found))
        .collect();
    Error::Unsatisfiable {
        name: name.to_string(),
        trace,
    }
}

/// Kahn's algorithm over the chosen closure, dependencies first. When
/// several nodes are ready at once the catalog/discovery order decides,
/// so results are reproducible. Cycles are reported, never broken.
fn topological_order(
    graph: &PackageGraph,
    chosen: &BTreeMap<String, Version>,
) -> Result<Vec<ExtensionId>> {
    let ids: HashMap<&str, ExtensionId> = chosen
        .iter()
        .map(|(name, version)| (name.as_str(), ExtensionId::new(name, version.clone())))
        .collect();

    // Pending dependency count per name, counting only edges that stay
    // inside the closure.
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (&name, id) in &ids {
        let Some(index) = graph.index_of(id) else {
            continue;
        };
        let mut count = 0;
        for edge in &graph.node(index).edges {
            if ids.contains_key(edge.name.as_str()) {
                count += 1;
                dependents.entry(edge.name.as_str()).or_default().push(name);
            }
        }
        pending.insert(name, count);
    }

    let position = |name: &str| graph.index_of(&ids[name]).unwrap_or(usize::MAX);

    let mut ready: Vec<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();
    ready.sort_by_key(|name| position(name));

    let mut order = Vec::with_capacity(ids.len());
    while !ready.is_empty() {
        let next = ready.remove(0);
        order.push(next);
        for &dependent in dependents.get(next).map(Vec::as_slice).unwrap_or(&[]) {
            let Some(count) = pending.get_mut(dependent) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                ready.push(dependent);
                ready.sort_by_key(|name| position(name));
            }
        }
    }

    if order.len() != ids.len() {
        let emitted: BTreeSet<&str> = order.iter().copied().collect();
        let participants = ids
            .keys()
            .filter(|name| !emitted.contains(**name))
            .map(|name| ids[*name].to_string())
            .collect();
        return Err(Error::Cycle { participants });
    }

    Ok(order
        .into_iter()
        .map(|name| ids[name].clone())
        .filter(|id| {
            graph
                .index_of(id)
                .is_none_or(|index| !graph.node(index).synthetic)
        })
        .collect())
}
