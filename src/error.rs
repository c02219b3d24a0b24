//! Error types for taskdeck
//!
//! Exit codes used by the inspection CLI:
//! - 0: Success
//! - 2: User error (bad args, unknown task or project, invalid config)
//! - 3: Data integrity (ambiguous parent, cyclic sub-tasks)
//! - 4: Operation failed (record store, io, journal)

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{ProjectId, RecordId};

/// Exit codes for the taskdeck CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const INTEGRITY: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskdeck operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {id} in project {project}")]
    TaskNotFound { id: RecordId, project: ProjectId },

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Move not found: {0}")]
    MoveNotFound(String),

    // Data integrity (exit code 3)
    #[error("Task {child} is listed as sub-task by both {first} and {second}")]
    AmbiguousParent {
        child: RecordId,
        first: RecordId,
        second: RecordId,
    },

    #[error("Cyclic sub-task reference through task {0}")]
    CycleDetected(RecordId),

    // Operation failures (exit code 4)
    #[error("Record store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Move {move_id} cannot continue: {reason}")]
    MoveBlocked { move_id: String, reason: String },
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound { .. }
            | Error::ProjectNotFound(_)
            | Error::MoveNotFound(_) => exit_codes::USER_ERROR,

            Error::AmbiguousParent { .. } | Error::CycleDetected(_) => exit_codes::INTEGRITY,

            Error::Store(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::MoveBlocked { .. } => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for errors that carry ids
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound { id, project } => Some(serde_json::json!({
                "id": id,
                "project": project,
            })),
            Error::AmbiguousParent {
                child,
                first,
                second,
            } => Some(serde_json::json!({
                "child": child,
                "parents": [first, second],
            })),
            Error::CycleDetected(id) => Some(serde_json::json!({ "id": id })),
            Error::MoveBlocked { move_id, .. } => Some(serde_json::json!({ "move_id": move_id })),
            _ => None,
        }
    }
}

/// Result type alias for taskdeck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
