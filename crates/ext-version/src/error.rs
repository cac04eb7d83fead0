/// Errors that can occur while parsing version ranges.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Range syntax was not recognized. Carries the original string so the
    /// caller can show it verbatim.
    #[error("malformed version range '{range}': {reason}")]
    MalformedRange { range: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
