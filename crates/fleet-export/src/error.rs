//! Export error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite write failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;
