//! End-to-end integration test for the full engine flow:
//! declaration parsing -> catalog -> activation -> demand merging ->
//! value validation.

use ext_catalog::{Catalog, ExtensionId, parse_declaration};
use ext_config::{Qualifier, USER, UserOverlay, Validation, merge, validate};
use ext_solver::HostVersions;
use ext_state::ActivationState;
use pretty_assertions::assert_eq;
use semver::Version;
use serde_json::json;

const ENGINE: &str = r#"
name: engine
display-name: Game Engine Hooks
version: 1.0.0
type: module
options:
  - url: speed
    name: speed
    type: integer
    default: 5
    range:
      min: 0
      max: 100
"#;

const BALANCE: &str = r#"
name: balance
version: 1.0.0
type: plugin
dependencies:
  engine: "^1.0.0"
  framework: "^3.0.0"
config-sparse:
  modules:
    engine:
      config:
        speed:
          contents:
            required-range:
              min: 10
              max: 20
"#;

const PRESET: &str = r#"
name: preset
version: 1.0.0
type: plugin
dependencies:
  engine: "^1.0.0"
  balance: "^1.0.0"
config-sparse:
  modules:
    engine:
      config:
        speed:
          contents:
            suggested-value: 15
        ghost:
          contents:
            suggested-value: true
"#;

fn setup() -> ActivationState {
    let extensions = [ENGINE, BALANCE, PRESET]
        .iter()
        .map(|doc| parse_declaration(doc).unwrap())
        .collect();
    let catalog = Catalog::new(extensions).unwrap();
    ActivationState::new(catalog, &HostVersions::default()).unwrap()
}

fn id(name: &str, version: &str) -> ExtensionId {
    ExtensionId::new(name, Version::parse(version).unwrap())
}

#[test]
fn test_activation_pulls_dependencies_in_order() {
    let state = setup();
    assert!(state.graph().validate_all().is_ok());

    let state = state.activate(&id("preset", "1.0.0")).unwrap();
    let order: Vec<String> = state.active().iter().map(ToString::to_string).collect();
    assert_eq!(
        order,
        vec!["engine@1.0.0", "balance@1.0.0", "preset@1.0.0"]
    );
}

#[test]
fn test_merged_value_and_validation() {
    let state = setup().activate(&id("preset", "1.0.0")).unwrap();
    let specs = state.catalog().option_specs().unwrap();
    let merged = merge(&specs, &state.active_extensions(), None);

    // A suggestion inside a live required range takes the value.
    let entry = &merged.entries["engine.speed"];
    assert_eq!(entry.value, json!(15));
    assert_eq!(entry.qualifier, Qualifier::Suggested);
    assert_eq!(entry.governed_by.as_deref(), Some("preset"));
    assert!(merged.conflicts.is_empty());

    // The demand on an undeclared URL is reported, not fatal.
    assert_eq!(merged.warnings.len(), 1);
    assert_eq!(merged.warnings[0].url, "engine.ghost");

    let spec = &specs["engine.speed"].spec;
    assert!(validate(spec, &entry.constraints, &entry.value).is_ok());
    assert!(validate(spec, &entry.constraints, &json!(25)).is_error());
    assert!(validate(spec, &entry.constraints, &json!("fast")).is_error());
}

#[test]
fn test_user_overlay_overrides_suggestion() {
    let state = setup().activate(&id("preset", "1.0.0")).unwrap();
    let specs = state.catalog().option_specs().unwrap();

    let mut overlay = UserOverlay::default();
    overlay.0.insert(
        "engine.speed".to_string(),
        serde_yaml::from_str("required-value: 18").unwrap(),
    );
    let merged = merge(&specs, &state.active_extensions(), Some(&overlay));

    let entry = &merged.entries["engine.speed"];
    assert_eq!(entry.value, json!(18));
    assert_eq!(entry.qualifier, Qualifier::User);
    assert_eq!(entry.governed_by.as_deref(), Some(USER));
    assert!(merged.conflicts.is_empty());

    let spec = &specs["engine.speed"].spec;
    assert_eq!(
        validate(spec, &entry.constraints, &entry.value),
        Validation::Ok
    );
}

#[test]
fn test_overlay_round_trips_through_yaml() {
    let mut overlay = UserOverlay::default();
    overlay.0.insert(
        "engine.speed".to_string(),
        serde_yaml::from_str("required-value: 18").unwrap(),
    );
    let text = serde_yaml::to_string(&overlay).unwrap();
    let restored: UserOverlay = serde_yaml::from_str(&text).unwrap();
    assert_eq!(
        restored.0["engine.speed"].required_value,
        Some(json!(18))
    );
}

#[test]
fn test_deactivation_respects_dependents() {
    let state = setup().activate(&id("preset", "1.0.0")).unwrap();
    let err = state.deactivate(&id("balance", "1.0.0")).unwrap_err();
    assert!(matches!(err, ext_state::Error::StillRequired { .. }));

    let state = state.deactivate(&id("preset", "1.0.0")).unwrap();
    assert!(state.active().is_empty());
}
