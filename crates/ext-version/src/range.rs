//! Version range parsing and matching.
//!
//! Dependency declarations use one of four range forms:
//!
//! - `==1.2.3` — exact pin
//! - `>=1.2.3` — minimum-inclusive
//! - `^1.2.3` — caret-compatible (semver caret semantics)
//! - `*` (or an empty string) — any version
//!
//! Anything else is rejected with [`Error::MalformedRange`]; the engine
//! never guesses the intent of an unsupported operator. Two-component
//! versions normalize by appending `.0` (`"1.2"` reads as `1.2.0`).
//!
//! # Examples
//!
//! ```
//! use ext_version::VersionRange;
//! use semver::Version;
//!
//! let range = VersionRange::parse(">= 0.1.0").unwrap();
//! assert!(range.matches(&Version::new(1, 1, 0)));
//! assert!(!range.matches(&Version::new(0, 0, 9)));
//!
//! let caret = VersionRange::parse("^1.0.1").unwrap();
//! assert!(caret.matches(&Version::new(1, 4, 0)));
//! assert!(!caret.matches(&Version::new(2, 0, 0)));
//! ```

use semver::Version;

use crate::error::{Error, Result};

/// The typed predicate behind a range string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RangeKind {
    /// `==x.y.z`
    Exact(Version),
    /// `>=x.y.z`
    Minimum(Version),
    /// `^x.y.z`
    Compatible(Version),
    /// `*`
    Any,
}

/// A parsed version range that can be checked against concrete versions.
///
/// Keeps the original string for display, like the raw ranges the
/// declaration files carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    kind: RangeKind,
    raw: String,
}

impl VersionRange {
    /// Parse a range string.
    ///
    /// Whitespace between the operator and the version is tolerated
    /// (`">= 0.1.0"` occurs in real catalogs).
    pub fn parse(range: &str) -> Result<Self> {
        let raw = range.to_string();
        let trimmed = range.trim();

        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self {
                kind: RangeKind::Any,
                raw,
            });
        }

        let (kind, version_str) = if let Some(rest) = trimmed.strip_prefix("==") {
            (RangeOp::Exact, rest)
        } else if let Some(rest) = trimmed.strip_prefix(">=") {
            (RangeOp::Minimum, rest)
        } else if let Some(rest) = trimmed.strip_prefix('^') {
            (RangeOp::Compatible, rest)
        } else if trimmed.starts_with(['>', '<', '=', '~', '!']) {
            return Err(Error::MalformedRange {
                range: raw,
                reason: "unsupported operator (expected ==, >=, ^ or *)".to_string(),
            });
        } else {
            // Bare version pins exactly, matching how the original
            // declaration files treat an operator-less range.
            (RangeOp::Exact, trimmed)
        };

        let version = normalize_version(version_str).map_err(|reason| Error::MalformedRange {
            range: raw.clone(),
            reason,
        })?;

        let kind = match kind {
            RangeOp::Exact => RangeKind::Exact(version),
            RangeOp::Minimum => RangeKind::Minimum(version),
            RangeOp::Compatible => RangeKind::Compatible(version),
        };

        Ok(Self { kind, raw })
    }

    /// Parse a range used for config-file replay, where only exact pins
    /// are implemented. Every operator other than `==` (or a bare
    /// version) is rejected.
    pub fn parse_pinned(range: &str) -> Result<Self> {
        let parsed = Self::parse(range)?;
        match parsed.kind {
            RangeKind::Exact(_) => Ok(parsed),
            _ => Err(Error::MalformedRange {
                range: range.to_string(),
                reason: "only exact pins (==) are supported for replayed config entries"
                    .to_string(),
            }),
        }
    }

    /// Build an exact-match range for a known version.
    pub fn exact(version: Version) -> Self {
        Self {
            raw: format!("=={version}"),
            kind: RangeKind::Exact(version),
        }
    }

    /// A range matching every version.
    pub fn any() -> Self {
        Self {
            kind: RangeKind::Any,
            raw: "*".to_string(),
        }
    }

    /// The pinned version, when this range is an exact pin.
    pub fn as_exact(&self) -> Option<&Version> {
        match &self.kind {
            RangeKind::Exact(v) => Some(v),
            _ => None,
        }
    }

    /// Check whether a concrete version satisfies this range.
    pub fn matches(&self, candidate: &Version) -> bool {
        match &self.kind {
            RangeKind::Exact(v) => candidate == v,
            RangeKind::Minimum(v) => candidate >= v,
            RangeKind::Compatible(v) => caret_matches(v, candidate),
            RangeKind::Any => true,
        }
    }

    /// The original range string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw.trim())
    }
}

enum RangeOp {
    Exact,
    Minimum,
    Compatible,
}

/// Semver caret semantics: compatible within the leftmost non-zero
/// component.
fn caret_matches(base: &Version, candidate: &Version) -> bool {
    if candidate < base {
        return false;
    }
    if base.major > 0 {
        candidate.major == base.major
    } else if base.minor > 0 {
        candidate.major == 0 && candidate.minor == base.minor
    } else {
        candidate == base
    }
}

/// Normalize a version string to semver, appending `.0` for a missing
/// patch component.
pub(crate) fn normalize_version(s: &str) -> std::result::Result<Version, String> {
    let s = s.trim();

    if let Ok(v) = Version::parse(s) {
        return Ok(v);
    }

    let with_patch = format!("{s}.0");
    Version::parse(&with_patch).map_err(|e| format!("invalid version '{s}': {e}"))
}

/// Sort versions newest-first, for candidate selection and display.
pub fn sort_newest_first(versions: &mut [Version]) {
    versions.sort_by(|a, b| b.cmp(a));
}
