//! Scenario tests over a realistic mod catalog, including the
//! first-time-use pass on a fresh installation and its failure mode on
//! an internally broken catalog.

use std::collections::BTreeMap;

use ext_catalog::{Catalog, Extension, ExtensionId, ExtensionKind};
use ext_solver::HostVersions;
use ext_state::ActivationState;
use ext_version::VersionRange;
use pretty_assertions::assert_eq;
use semver::Version;

fn ext(name: &str, version: &str, deps: &[(&str, &str)]) -> Extension {
    Extension {
        name: name.to_string(),
        version: Version::parse(version).unwrap(),
        kind: ExtensionKind::Module,
        display_name: name.to_string(),
        dependencies: deps
            .iter()
            .map(|(n, r)| (n.to_string(), VersionRange::parse(r).unwrap()))
            .collect::<BTreeMap<_, _>>(),
        option_specs: Vec::new(),
        demands: Vec::new(),
    }
}

/// A catalog mirroring a real UCP installation: eleven modules plus the
/// ucp2 plugin family layered on top of them.
fn full_catalog() -> Vec<Extension> {
    vec![
        ext("aicloader", "1.1.0", &[]),
        ext(
            "aiSwapper",
            "1.1.0",
            &[
                ("gmResourceModifier", ">= 0.1.0"),
                ("textResourceModifier", ">= 0.1.0"),
                ("aicloader", ">= 0.1.0"),
                ("aivloader", ">= 0.0.1"),
                ("files", ">= 0.1.0"),
            ],
        ),
        ext("aivloader", "1.0.0", &[("files", ">= 0.0.1")]),
        ext("files", "1.1.0", &[]),
        ext("gmResourceModifier", "0.2.0", &[]),
        ext(
            "graphicsApiReplacer",
            "1.2.0",
            &[("winProcHandler", ">= 0.1.0")],
        ),
        ext("maploader", "1.0.0", &[("files", ">= 0.2.0")]),
        ext("startResources", "1.0.0", &[]),
        ext("textResourceModifier", "0.3.0", &[]),
        ext("ucp2-legacy", "2.15.1", &[]),
        ext("winProcHandler", "0.2.0", &[]),
        ext(
            "ucp2-ai-files",
            "2.15.1",
            &[
                ("aiSwapper", "^1.0.1"),
                ("framework", "^3.0.0"),
                ("frontend", "^1.0.0"),
            ],
        ),
        ext(
            "ucp2-aic-patch",
            "2.15.1",
            &[
                ("ucp2-ai-files", "^2.15.1"),
                ("ucp2-legacy", "^2.15.1"),
                ("framework", "^3.0.0"),
                ("frontend", "^1.0.0"),
            ],
        ),
        ext(
            "ucp2-legacy-defaults",
            "2.15.1",
            &[
                ("ucp2-legacy", "^2.15.1"),
                ("ucp2-ai-files", "^2.15.1"),
                ("ucp2-aic-patch", "^2.15.1"),
                ("ucp2-vanilla-fixed-aiv", "^2.15.1"),
            ],
        ),
        ext(
            "ucp2-vanilla-fixed-aiv",
            "2.15.1",
            &[
                ("ucp2-ai-files", "^2.15.1"),
                ("framework", "^3.0.0"),
                ("frontend", "^1.0.0"),
            ],
        ),
    ]
}

fn state_for(extensions: Vec<Extension>) -> ActivationState {
    let catalog = Catalog::new(extensions).unwrap();
    ActivationState::new(catalog, &HostVersions::default()).unwrap()
}

fn id(name: &str, version: &str) -> ExtensionId {
    ExtensionId::new(name, Version::parse(version).unwrap())
}

fn position(state: &ActivationState, name: &str) -> usize {
    state
        .active()
        .iter()
        .position(|id| id.name == name)
        .unwrap_or_else(|| panic!("{name} not active"))
}

/// Every dependency of every active extension appears earlier in the
/// activation order.
fn assert_topological(state: &ActivationState) {
    for ext in state.active_extensions() {
        for dep_name in ext.dependencies.keys() {
            if dep_name == "frontend" || dep_name == "framework" {
                continue;
            }
            assert!(
                position(state, dep_name) < position(state, &ext.name),
                "{dep_name} must precede {}",
                ext.name
            );
        }
    }
}

#[test]
fn test_first_time_use_activates_whole_catalog() {
    let state = state_for(full_catalog()).first_time_use().unwrap();
    assert_eq!(state.active().len(), 15);
    assert_topological(&state);
}

#[test]
fn test_auto_activate_default_selection() {
    let state = state_for(full_catalog());
    let state = state
        .auto_activate(&["graphicsApiReplacer", "ucp2-legacy-defaults"])
        .unwrap();

    let mut active: Vec<&str> = state.active().iter().map(|id| id.name.as_str()).collect();
    active.sort_unstable();
    assert_eq!(
        active,
        vec![
            "aiSwapper",
            "aicloader",
            "aivloader",
            "files",
            "gmResourceModifier",
            "graphicsApiReplacer",
            "textResourceModifier",
            "ucp2-ai-files",
            "ucp2-aic-patch",
            "ucp2-legacy",
            "ucp2-legacy-defaults",
            "ucp2-vanilla-fixed-aiv",
            "winProcHandler",
        ]
    );
    assert_topological(&state);
    // Synthetic roots never surface in the order.
    assert!(!state.active().iter().any(|id| id.name == "frontend"));
    assert!(!state.active().iter().any(|id| id.name == "framework"));
}

#[test]
fn test_broken_catalog_fails_first_time_use() {
    let extensions: Vec<Extension> = full_catalog()
        .into_iter()
        .filter(|e| e.name != "aiSwapper")
        .collect();
    let state = state_for(extensions);

    let err = state
        .auto_activate(&["graphicsApiReplacer", "ucp2-legacy-defaults"])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not fix dependency issues: ucp2-legacy-defaults: 2.15.1 ()"
    );
}

#[test]
fn test_deactivating_shared_dependency_is_rejected() {
    let state = state_for(full_catalog());
    let state = state.activate(&id("ucp2-ai-files", "2.15.1")).unwrap();

    let err = state.deactivate(&id("files", "1.1.0")).unwrap_err();
    match err {
        ext_state::Error::StillRequired {
            extension,
            required_by,
        } => {
            assert_eq!(extension, "files@1.1.0");
            assert_eq!(
                required_by,
                vec!["aiSwapper@1.1.0".to_string(), "aivloader@1.0.0".to_string()]
            );
        }
        other => panic!("expected StillRequired, got {other:?}"),
    }
    // The rejected transition changed nothing.
    assert!(state.is_active(&id("files", "1.1.0")));
}

#[test]
fn test_deactivating_explicit_top_frees_closure() {
    let state = state_for(full_catalog());
    let state = state.activate(&id("ucp2-ai-files", "2.15.1")).unwrap();
    assert_eq!(state.active().len(), 7);

    let state = state.deactivate(&id("ucp2-ai-files", "2.15.1")).unwrap();
    assert!(state.active().is_empty());
}

#[test]
fn test_resolution_is_reproducible() {
    let a = state_for(full_catalog())
        .activate(&id("ucp2-legacy-defaults", "2.15.1"))
        .unwrap();
    let b = state_for(full_catalog())
        .activate(&id("ucp2-legacy-defaults", "2.15.1"))
        .unwrap();
    assert_eq!(a.active(), b.active());
}
