//! Error types for tally
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, missing user identity, unknown task)
//! - 4: Operation failed (storage I/O, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tally CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tally operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("no user identity; pass --user, set TALLY_USER, or configure [user] default")]
    MissingUser,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task id '{id}' is ambiguous ({matches} matches)")]
    AmbiguousTaskId { id: String, matches: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::MissingUser
            | Error::TaskNotFound(_)
            | Error::AmbiguousTaskId { .. }
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details attached to the JSON error envelope
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::AmbiguousTaskId { id, matches } => {
                Some(serde_json::json!({ "task_id": id, "matches": matches }))
            }
            _ => None,
        }
    }
}

/// Result type alias for tally operations
pub type Result<T> = std::result::Result<T, Error>;
