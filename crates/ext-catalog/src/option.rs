//! Option specifications.
//!
//! Every configurable value an extension exposes is described by an
//! [`OptionSpec`]: a unique dotted URL (namespaced by the owning
//! extension), a value type, a default, and an optional numeric range or
//! choice set. The engine only reasons about these declarations; it does
//! not interpret game semantics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Boolean,
    Integer,
    Real,
    String,
    Path,
    /// Value must be a member of the declared choice set.
    Choice,
    /// A list of values.
    List,
}

/// Inclusive numeric bounds on an option value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether two ranges share at least one value.
    pub fn overlaps(&self, other: &NumericRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// The intersection of two ranges, if any.
    pub fn intersect(&self, other: &NumericRange) -> Option<NumericRange> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(NumericRange { min, max })
    }
}

impl std::fmt::Display for NumericRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// One option declaration, owned by exactly one extension.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptionSpec {
    /// Dotted path, unique across the catalog once namespaced.
    pub url: String,
    /// Short name used for display.
    #[serde(default)]
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub value_type: OptionType,
    /// Default value, usually the game's original value.
    pub default: Value,
    /// Valid numeric bounds, when the type is numeric.
    #[serde(default)]
    pub range: Option<NumericRange>,
    /// Enumerated valid values, when the type is choice-based.
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
}
