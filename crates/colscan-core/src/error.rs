use thiserror::Error;

/// Canonical result for the scan engine.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid scan specification: {0}")]
    Spec(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Type hydration failed: {0}")]
    Hydration(String),

    // Errors surfaced by the row-fetch engine or the transaction layer while
    // starting or advancing a scan. Fatal to the operator; never retried here.
    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Memory budget exceeded: {0}")]
    Budget(String),

    // Assertion-class failures: a violated internal invariant, not an
    // ordinary runtime condition. Kept distinct so callers can tell a caller
    // bug from a transient execution error.
    #[error("Internal invariant failed: {0}")]
    Internal(String),
}

impl Error {
    /// True for assertion-class failures (internal invariant violations).
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
