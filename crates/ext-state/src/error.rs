use ext_catalog::ExtensionId;

/// One extension the first-time-use pass could not reconcile.
#[derive(Debug, Clone)]
pub struct AutoActivateFailure {
    pub id: ExtensionId,
    pub details: Vec<String>,
}

impl std::fmt::Display for AutoActivateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.id.name,
            self.id.version,
            self.details.join(", ")
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request named an extension the catalog does not contain.
    #[error("unknown extension: {id}")]
    UnknownExtension { id: String },

    /// Deactivation requested for an extension that is not active.
    #[error("extension is not active: {id}")]
    NotActive { id: String },

    /// Deactivation rejected: other active extensions still need this one.
    #[error("cannot deactivate {extension}: still required by {}", required_by.join(", "))]
    StillRequired {
        extension: String,
        required_by: Vec<String>,
    },

    /// The first-time-use pass could not reconcile these extensions.
    #[error("Could not fix dependency issues: {}", failures.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    AutoActivate { failures: Vec<AutoActivateFailure> },

    /// A persisted load-order entry is not of the form `name == version`.
    #[error("malformed load-order entry '{entry}': expected 'name == version'")]
    MalformedLoadEntry { entry: String },

    #[error(transparent)]
    Range(#[from] ext_version::Error),

    #[error(transparent)]
    Solve(#[from] ext_solver::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
