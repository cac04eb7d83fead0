//! Configuration demands.
//!
//! A demand is a declarative constraint or suggestion an extension
//! places on an option URL while the extension is active. The field
//! names mirror the sparse config format the discovery process reads
//! (`required-value`, `suggested-range`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::option::NumericRange;

/// The payload of one demand: any combination of required and suggested
/// constraints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DemandContents {
    /// Exact value the option must take.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_value: Option<Value>,
    /// Set of acceptable values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_values: Option<Vec<Value>>,
    /// The acceptable set is the union of all declared sets.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required_inclusive: bool,
    /// The acceptable set is the intersection of all declared sets;
    /// wins over `required_inclusive` when both are set.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required_exclusive: bool,
    /// Numeric bounds the value must stay within.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_range: Option<NumericRange>,
    /// Value the option should take unless something requires otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<Value>,
    /// Values the option should prefer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_values: Option<Vec<Value>>,
    /// Numeric bounds the value should stay within (soft).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_range: Option<NumericRange>,
}

impl DemandContents {
    /// Whether this demand carries any hard constraint.
    pub fn has_required(&self) -> bool {
        self.required_value.is_some()
            || self.required_values.is_some()
            || self.required_range.is_some()
    }

    /// Whether this demand carries any soft constraint.
    pub fn has_suggested(&self) -> bool {
        self.suggested_value.is_some()
            || self.suggested_values.is_some()
            || self.suggested_range.is_some()
    }
}

/// A demand bound to the option URL it targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfigDemand {
    pub url: String,
    pub contents: DemandContents,
}
