//! Structured merge diagnostics.
//!
//! These are data, not control flow: one option's conflict never stops
//! other options from merging, so they are collected into the merge
//! output instead of being returned as a `Result`. Each carries enough
//! identity to be rendered verbatim without further lookups.

/// Two required demands on the same URL contradict each other.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("conflict on '{url}': {earlier_extension} requires {earlier_constraint}, {later_extension} requires {later_constraint}")]
pub struct ConfigConflict {
    pub url: String,
    pub earlier_extension: String,
    pub earlier_constraint: String,
    pub later_extension: String,
    pub later_constraint: String,
}

/// A demand targets a URL no active extension declares an option for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dangling demand: {extension} targets unknown option '{url}'")]
pub struct DanglingDemand {
    pub extension: String,
    pub url: String,
}
