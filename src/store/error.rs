use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open history file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to read CSV header of history file '{0}'")]
    Header(PathBuf, #[source] csv::Error),

    #[error("Failed to create history directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing history file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing history file '{0}'")]
    Csv(PathBuf, #[source] csv::Error),

    #[error("Failed to move temporary file over history file '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("History writer lock was poisoned by a panicked writer")]
    LockPoisoned,
}

/// A history row that could not be turned into a record.
///
/// These are logged and skipped during a load; they never abort it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Skipped malformed history row at line {line}: {reason}")]
pub struct RowParseError {
    /// 1-based line number in the file, header included.
    pub line: u64,
    pub reason: String,
}
