//! Error types for the LSM R-tree.

use thiserror::Error;

/// Errors surfaced by the index, its configuration and the import utility.
#[derive(Error, Debug)]
pub enum LsmError {
    /// Construction-time configuration is unusable (e.g. fanout bounds).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A payload or query box with non-finite coordinates.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A structural tree invariant does not hold. Only diagnostic checks
    /// produce this; normal operation never does.
    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),

    /// Background merge tasks failed since the last time this was reported.
    #[error("{failed} background merge task(s) failed")]
    BackgroundTask { failed: usize },

    /// The index was closed and no longer accepts work.
    #[error("Index has been shut down")]
    ShutDown,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LsmError>;
