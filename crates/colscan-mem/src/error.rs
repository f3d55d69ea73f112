use thiserror::Error;

/// Result type local to colscan-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("memory budget exceeded for tag '{tag}': requested {requested} bytes, capacity {capacity}, used {used}")]
    BudgetExceeded {
        tag: &'static str,
        requested: usize,
        capacity: usize,
        used: usize,
    },
}

impl From<Error> for colscan_core::error::Error {
    fn from(e: Error) -> Self {
        colscan_core::error::Error::Budget(e.to_string())
    }
}
