/// Errors that can occur while building or solving the package graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A catalog extension uses one of the reserved synthetic root names.
    #[error("extension name '{name}' is reserved for the host application")]
    ReservedName { name: String },

    /// An operation referenced a node that is not in the graph.
    #[error("unknown package: {id}")]
    UnknownNode { id: String },

    /// No version of a package satisfies every constraint in the closure.
    /// `trace` lists the competing constraints, one human-readable line
    /// per dependent.
    #[error("could not resolve '{name}': no version satisfies all constraints\n{}", trace.join("\n"))]
    Unsatisfiable { name: String, trace: Vec<String> },

    /// The resolved subgraph contains a dependency cycle.
    #[error("dependency cycle involving: {}", participants.join(", "))]
    Cycle { participants: Vec<String> },
}

pub type Result<T> = std::result::Result<T, Error>;
