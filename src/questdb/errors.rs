use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a run. Structural defects in the quest graph are findings, not errors.
#[derive(Debug, Error)]
pub enum QuestDbError {
    /// The dataset file does not exist.
    #[error("dataset not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but is not a well-formed dataset document.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Wrapper around serde_json errors raised while rendering output.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Wrapper around IO errors (reads, temp files, renames).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Input that parsed but cannot be used (e.g. a raw task export with the wrong shape).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
