/// Errors that can occur in the catalog layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two catalog entries share the same `(name, version)` pair.
    #[error("duplicate extension detected: {name}@{version}")]
    DuplicateExtension { name: String, version: String },

    /// Two option specifications claim the same URL.
    #[error("option url already has a value: {url} (owned by {owner}, re-declared by {other})")]
    DuplicateOptionUrl {
        url: String,
        owner: String,
        other: String,
    },

    /// Failed to parse an extension declaration document.
    #[error("failed to parse extension declaration: {0}")]
    DeclarationParse(#[from] serde_yaml::Error),

    /// Declaration carried an invalid extension name.
    #[error("invalid extension name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Declaration carried an invalid semver version string.
    #[error("invalid version '{version}' for extension '{name}': {source}")]
    InvalidVersion {
        name: String,
        version: String,
        source: semver::Error,
    },

    /// Declaration carried an invalid extension type.
    #[error("invalid extension type '{value}' for extension '{name}' (expected module or plugin)")]
    InvalidKind { name: String, value: String },

    /// A dependency range failed to parse.
    #[error("invalid dependency range on '{dependency}' declared by '{name}': {source}")]
    InvalidRange {
        name: String,
        dependency: String,
        source: ext_version::Error,
    },

    /// A sparse config tree held two demands for the same URL.
    #[error("config url already has been set: {url}")]
    DuplicateDemandUrl { url: String },
}

pub type Result<T> = std::result::Result<T, Error>;
