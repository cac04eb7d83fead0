//! Value validation against option declarations.
//!
//! Classifies a candidate value against the declared type, choice set,
//! and numeric bounds, plus whatever constraints the merge accumulated.
//! Data-shape problems are results, never panics.

use ext_catalog::{OptionSpec, OptionType};
use serde_json::Value;

use crate::merge::EffectiveConstraints;

/// Outcome of checking one value against one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    /// The value is acceptable but outside what was suggested.
    Warning(String),
    /// The value violates a declared type, choice set, or hard range.
    Error(String),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Validation::Error(_))
    }
}

/// Check `value` against the option declaration and the merged
/// constraints for its URL. Pass [`EffectiveConstraints::default`] when
/// no merge has run.
pub fn validate(
    spec: &OptionSpec,
    constraints: &EffectiveConstraints,
    value: &Value,
) -> Validation {
    if let Some(reason) = type_mismatch(spec, value) {
        return Validation::Error(reason);
    }

    if spec.value_type == OptionType::Choice {
        let Some(choices) = &spec.choices else {
            return Validation::Error(format!(
                "'{}' is choice-typed but declares no choices",
                spec.url
            ));
        };
        if !choices.contains(value) {
            return Validation::Error(format!(
                "{value} is not one of the declared choices for '{}'",
                spec.url
            ));
        }
    }

    if let Some(permitted) = &constraints.permitted_values
        && !permitted.contains(value)
    {
        return Validation::Error(format!(
            "{value} is outside the required value set for '{}'",
            spec.url
        ));
    }

    if let Some(number) = value.as_f64() {
        if let Some(range) = &spec.range
            && !range.contains(number)
        {
            return Validation::Error(format!(
                "{number} is outside the declared range {range} of '{}'",
                spec.url
            ));
        }
        if let Some(range) = &constraints.required_range
            && !range.contains(number)
        {
            return Validation::Error(format!(
                "{number} is outside the required range {range} of '{}'",
                spec.url
            ));
        }
        if let Some(range) = &constraints.suggested_range
            && !range.contains(number)
        {
            return Validation::Warning(format!(
                "{number} is outside the suggested range {range} of '{}'",
                spec.url
            ));
        }
    }

    Validation::Ok
}

fn type_mismatch(spec: &OptionSpec, value: &Value) -> Option<String> {
    let ok = match spec.value_type {
        OptionType::Boolean => value.is_boolean(),
        OptionType::Integer => value.is_i64() || value.is_u64(),
        OptionType::Real => value.is_number(),
        OptionType::String | OptionType::Path => value.is_string(),
        // Choice membership is checked separately against the set.
        OptionType::Choice => true,
        OptionType::List => value.is_array(),
    };
    (!ok).then(|| {
        format!(
            "'{}' expects a {:?} value, got {value}",
            spec.url, spec.value_type
        )
    })
}
