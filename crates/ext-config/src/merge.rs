//! Demand merging.
//!
//! Replays every active extension's configuration demands, in activation
//! order, into one overlay per option URL. Later required demands that
//! contradict earlier ones are hard conflicts: merging stops for that
//! URL only, the value falls back to the last non-conflicting required
//! value (or the declared default), and every other URL keeps merging.
//! Suggestions never conflict; the most recent one wins wherever no
//! required value is live. A persisted user overlay is replayed last, as
//! if it were one more extension, under the same rules.

use std::collections::BTreeMap;

use ext_catalog::{DemandContents, Extension, NumericRange, OwnedOptionSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{ConfigConflict, DanglingDemand};

/// Provenance label for the persisted overlay.
pub const USER: &str = "user";

/// Why an option holds its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    /// Nothing demanded anything; the declared default stands.
    Unspecified,
    /// A required demand pinned the value.
    Required,
    /// A suggestion set the value; the user may change it freely.
    Suggested,
    /// The persisted user overlay set the value.
    User,
}

/// Hard and soft constraints accumulated for one URL, handed to the
/// validator together with the merged value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveConstraints {
    pub required_range: Option<NumericRange>,
    pub permitted_values: Option<Vec<Value>>,
    pub suggested_range: Option<NumericRange>,
}

/// Final state of one option after the replay.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    pub value: Value,
    pub qualifier: Qualifier,
    /// Name of the extension whose demand governs the value, or
    /// [`USER`]; `None` while the default stands.
    pub governed_by: Option<String>,
    pub constraints: EffectiveConstraints,
}

/// The merged overlay plus everything that went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct MergedConfiguration {
    pub entries: BTreeMap<String, MergedEntry>,
    pub conflicts: Vec<ConfigConflict>,
    pub warnings: Vec<DanglingDemand>,
}

/// Sparse `{url: demand}` map persisted between sessions. Replayed as a
/// final, highest-priority pseudo-extension.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserOverlay(pub BTreeMap<String, DemandContents>);

/// Merge the demands of `order` (activation order, dependencies first)
/// over the option specs, then replay the user overlay.
pub fn merge(
    specs: &BTreeMap<String, OwnedOptionSpec>,
    order: &[&Extension],
    overlay: Option<&UserOverlay>,
) -> MergedConfiguration {
    // Owners are matched by name: the spec index always attributes a
    // URL to the newest version of its extension, while any one version
    // of that name may be the active one.
    let active: Vec<&str> = order.iter().map(|e| e.name.as_str()).collect();
    let mut states: BTreeMap<&String, UrlState> = specs
        .iter()
        .filter(|(_, owned)| active.contains(&owned.owner.name.as_str()))
        .map(|(url, owned)| (url, UrlState::new(&owned.spec.default)))
        .collect();

    let mut conflicts = Vec::new();
    let mut warnings = Vec::new();

    for ext in order {
        for demand in &ext.demands {
            match states.get_mut(&demand.url) {
                Some(state) => {
                    if let Some(conflict) =
                        state.apply(&demand.url, &ext.name, false, &demand.contents)
                    {
                        tracing::warn!(url = %demand.url, %conflict, "demand conflict");
                        conflicts.push(conflict);
                    }
                }
                None => {
                    warnings.push(DanglingDemand {
                        extension: ext.id().to_string(),
                        url: demand.url.clone(),
                    });
                }
            }
        }
    }

    if let Some(overlay) = overlay {
        for (url, contents) in &overlay.0 {
            match states.get_mut(url) {
                Some(state) => {
                    if let Some(conflict) = state.apply(url, USER, true, contents) {
                        tracing::warn!(%url, %conflict, "user overlay conflict");
                        conflicts.push(conflict);
                    }
                }
                None => {
                    warnings.push(DanglingDemand {
                        extension: USER.to_string(),
                        url: url.clone(),
                    });
                }
            }
        }
    }

    let entries = states
        .into_iter()
        .map(|(url, state)| (url.clone(), state.into_entry()))
        .collect();
    MergedConfiguration {
        entries,
        conflicts,
        warnings,
    }
}

/// Fold state for one URL during the replay.
#[derive(Debug)]
struct UrlState {
    default: Value,
    value: Value,
    qualifier: Qualifier,
    governed_by: Option<String>,
    required_value: Option<(Value, String)>,
    permitted: Option<(Vec<Value>, String)>,
    required_range: Option<(NumericRange, String)>,
    suggested_range: Option<NumericRange>,
    /// Set once a conflict hit this URL; later demands are ignored.
    poisoned: bool,
}

impl UrlState {
    fn new(default: &Value) -> Self {
        Self {
            default: default.clone(),
            value: default.clone(),
            qualifier: Qualifier::Unspecified,
            governed_by: None,
            required_value: None,
            permitted: None,
            required_range: None,
            suggested_range: None,
            poisoned: false,
        }
    }

    fn apply(
        &mut self,
        url: &str,
        owner: &str,
        user: bool,
        demand: &DemandContents,
    ) -> Option<ConfigConflict> {
        if self.poisoned {
            return None;
        }
        let hard = if user { Qualifier::User } else { Qualifier::Required };
        let soft = if user { Qualifier::User } else { Qualifier::Suggested };

        if let Some(value) = &demand.required_value {
            if let Some(conflict) = self.check_required_value(url, owner, value) {
                return Some(conflict);
            }
            self.required_value = Some((value.clone(), owner.to_string()));
            self.govern(value.clone(), hard, owner);
        }

        if let Some(values) = &demand.required_values {
            if let Some(conflict) = self.narrow_permitted(url, owner, values, demand) {
                return Some(conflict);
            }
            // A live required value must survive the narrowed set.
            if let Some((value, prev)) = &self.required_value {
                let (permitted, _) = self.permitted.as_ref().unwrap_or_else(|| unreachable!());
                if !permitted.contains(value) {
                    let conflict = ConfigConflict {
                        url: url.to_string(),
                        earlier_extension: prev.clone(),
                        earlier_constraint: format!("value {value}"),
                        later_extension: owner.to_string(),
                        later_constraint: format!("values {}", describe_set(values)),
                    };
                    return Some(self.poison(conflict));
                }
            }
            let (permitted, _) = self.permitted.as_ref().unwrap_or_else(|| unreachable!());
            if self.required_value.is_none() && !permitted.contains(&self.value) {
                let first = permitted[0].clone();
                self.govern(first, hard, owner);
            }
        }

        if let Some(range) = &demand.required_range {
            if let Some(conflict) = self.narrow_range(url, owner, range) {
                return Some(conflict);
            }
        }

        if demand.has_suggested() {
            let suggestion = demand
                .suggested_value
                .clone()
                .or_else(|| demand.suggested_values.as_ref().and_then(|v| v.first().cloned()));
            if let Some(suggestion) = suggestion {
                let admitted = self
                    .permitted
                    .as_ref()
                    .is_none_or(|(set, _)| set.contains(&suggestion));
                if self.required_value.is_none() && admitted {
                    self.govern(suggestion, soft, owner);
                }
            }
            if let Some(range) = &demand.suggested_range {
                self.suggested_range = Some(*range);
            }
        }

        None
    }

    fn check_required_value(
        &mut self,
        url: &str,
        owner: &str,
        value: &Value,
    ) -> Option<ConfigConflict> {
        if let Some((existing, prev)) = &self.required_value
            && existing != value
        {
            let conflict = ConfigConflict {
                url: url.to_string(),
                earlier_extension: prev.clone(),
                earlier_constraint: format!("value {existing}"),
                later_extension: owner.to_string(),
                later_constraint: format!("value {value}"),
            };
            return Some(self.poison(conflict));
        }
        if let Some((range, prev)) = &self.required_range
            && let Some(number) = value.as_f64()
            && !range.contains(number)
        {
            let conflict = ConfigConflict {
                url: url.to_string(),
                earlier_extension: prev.clone(),
                earlier_constraint: format!("range {range}"),
                later_extension: owner.to_string(),
                later_constraint: format!("value {value}"),
            };
            return Some(self.poison(conflict));
        }
        if let Some((permitted, prev)) = &self.permitted
            && !permitted.contains(value)
        {
            let conflict = ConfigConflict {
                url: url.to_string(),
                earlier_extension: prev.clone(),
                earlier_constraint: format!("values {}", describe_set(permitted)),
                later_extension: owner.to_string(),
                later_constraint: format!("value {value}"),
            };
            return Some(self.poison(conflict));
        }
        None
    }

    fn narrow_permitted(
        &mut self,
        url: &str,
        owner: &str,
        values: &[Value],
        demand: &DemandContents,
    ) -> Option<ConfigConflict> {
        let Some((existing, prev)) = self.permitted.take() else {
            self.permitted = Some((values.to_vec(), owner.to_string()));
            return None;
        };
        // Exclusive wins when both flags are set; a flagless set is
        // treated as exclusive since it is a hard constraint.
        let union = demand.required_inclusive && !demand.required_exclusive;
        if union {
            let mut merged = existing;
            for value in values {
                if !merged.contains(value) {
                    merged.push(value.clone());
                }
            }
            self.permitted = Some((merged, owner.to_string()));
            return None;
        }
        let intersection: Vec<Value> = existing
            .iter()
            .filter(|v| values.contains(v))
            .cloned()
            .collect();
        if intersection.is_empty() {
            return Some(self.poison(ConfigConflict {
                url: url.to_string(),
                earlier_extension: prev,
                earlier_constraint: format!("values {}", describe_set(&existing)),
                later_extension: owner.to_string(),
                later_constraint: format!("values {}", describe_set(values)),
            }));
        }
        self.permitted = Some((intersection, owner.to_string()));
        None
    }

    fn narrow_range(
        &mut self,
        url: &str,
        owner: &str,
        range: &NumericRange,
    ) -> Option<ConfigConflict> {
        if let Some((value, prev)) = &self.required_value
            && let Some(number) = value.as_f64()
            && !range.contains(number)
        {
            let conflict = ConfigConflict {
                url: url.to_string(),
                earlier_extension: prev.clone(),
                earlier_constraint: format!("value {value}"),
                later_extension: owner.to_string(),
                later_constraint: format!("range {range}"),
            };
            return Some(self.poison(conflict));
        }
        let Some((existing, prev)) = self.required_range.take() else {
            self.required_range = Some((*range, owner.to_string()));
            return None;
        };
        match existing.intersect(range) {
            Some(narrowed) => {
                self.required_range = Some((narrowed, owner.to_string()));
                None
            }
            None => Some(self.poison(ConfigConflict {
                url: url.to_string(),
                earlier_extension: prev,
                earlier_constraint: format!("range {existing}"),
                later_extension: owner.to_string(),
                later_constraint: format!("range {range}"),
            })),
        }
    }

    fn govern(&mut self, value: Value, qualifier: Qualifier, owner: &str) {
        self.value = value;
        self.qualifier = qualifier;
        self.governed_by = Some(owner.to_string());
    }

    /// Record the conflict and fall back to the last non-conflicting
    /// required value or the declared default.
    fn poison(&mut self, conflict: ConfigConflict) -> ConfigConflict {
        self.poisoned = true;
        match self.required_value.clone() {
            Some((value, owner)) => {
                let qualifier = if owner == USER {
                    Qualifier::User
                } else {
                    Qualifier::Required
                };
                self.govern(value, qualifier, &owner);
            }
            None => {
                self.value = self.default.clone();
                self.qualifier = Qualifier::Unspecified;
                self.governed_by = None;
            }
        }
        conflict
    }

    fn into_entry(self) -> MergedEntry {
        MergedEntry {
            value: self.value,
            qualifier: self.qualifier,
            governed_by: self.governed_by,
            constraints: EffectiveConstraints {
                required_range: self.required_range.map(|(range, _)| range),
                permitted_values: self.permitted.map(|(values, _)| values),
                suggested_range: self.suggested_range,
            },
        }
    }
}

fn describe_set(values: &[Value]) -> String {
    let inner = values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{inner}}}")
}
