//! Error types for media-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (task lifecycle, extraction engine, config)
//! - HTTP status code mapping for API integration
//! - The JSON error body returned by every API endpoint

use crate::types::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "queue_capacity")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// No task with this id is tracked
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// Task exists but has no deliverable artifact yet
    #[error("task {id} is not ready (status: {status})")]
    TaskNotReady {
        /// The task that was requested
        id: TaskId,
        /// Its current status
        status: TaskStatus,
    },

    /// Attempted status change violates the task state machine
    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The task being mutated
        id: TaskId,
        /// Current status
        from: TaskStatus,
        /// Requested status
        to: TaskStatus,
    },

    /// Extraction engine failure
    #[error("extraction failed: {0}")]
    Engine(#[from] EngineError),

    /// Post-processing produced no file at the expected location
    #[error("final artifact not found ({})", file_label(.path))]
    ArtifactMissing {
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// Admission queue is full
    #[error("job queue is full ({capacity} pending jobs), try again later")]
    QueueFull {
        /// Configured queue capacity
        capacity: usize,
    },

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// File name only; server directories are not shown to clients
fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Failures reported by an extraction engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be started
    #[error("failed to start {tool}: {reason}")]
    Spawn {
        /// Tool name or path
        tool: String,
        /// OS-level reason
        reason: String,
    },

    /// The engine ran and reported failure
    #[error("{diagnostics}")]
    Failed {
        /// Free-text diagnostics emitted by the engine
        diagnostics: String,
    },

    /// The engine succeeded but its output could not be interpreted
    #[error("unexpected engine output: {0}")]
    MalformedOutput(String),

    /// No engine is installed or configured
    #[error("{0}")]
    Unavailable(String),
}

impl EngineError {
    /// Raw diagnostic text, as fed to the error classifier
    pub fn diagnostics(&self) -> String {
        match self {
            EngineError::Failed { diagnostics } => diagnostics.clone(),
            other => other.to_string(),
        }
    }
}

impl Error {
    /// Raw failure text for classification
    ///
    /// Engine failures contribute their diagnostics verbatim so the classifier
    /// sees exactly what the engine printed.
    pub fn raw_diagnostics(&self) -> String {
        match self {
            Error::Engine(e) => e.diagnostics(),
            other => other.to_string(),
        }
    }
}

/// API error response format
///
/// Every failing endpoint answers with this body.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "status": "error",
///   "code": "task_not_found",
///   "message": "Task not found"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always `"error"`
    pub status: String,

    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found - unknown or not yet deliverable
            Error::TaskNotFound(_) => 404,
            Error::TaskNotReady { .. } => 404,

            // 409 Conflict - state machine violation
            Error::InvalidTransition { .. } => 409,

            // 500 Internal Server Error - Server-side issues
            Error::ArtifactMissing { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - Upstream extraction failed
            Error::Engine(_) => 502,

            // 503 Service Unavailable
            Error::QueueFull { .. } => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Validation(_) => "validation_error",
            Error::TaskNotFound(_) => "task_not_found",
            Error::TaskNotReady { .. } => "task_not_ready",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::Engine(e) => match e {
                EngineError::Spawn { .. } => "engine_spawn_failed",
                EngineError::Failed { .. } => "engine_failed",
                EngineError::MalformedOutput(_) => "engine_malformed_output",
                EngineError::Unavailable(_) => "engine_unavailable",
            },
            Error::ArtifactMissing { .. } => "artifact_missing",
            Error::QueueFull { .. } => "queue_full",
            Error::ShuttingDown => "shutting_down",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // Keep the wording clients already match on for the lookup failures
        let message = match &error {
            Error::TaskNotFound(_) => "Task not found".to_string(),
            Error::TaskNotReady { .. } => "File not ready or task not found".to_string(),
            Error::ArtifactMissing { .. } => "File not found on server".to_string(),
            other => other.to_string(),
        };

        ApiError {
            status: "error".to_string(),
            code: Some(code),
            message,
        }
    }
}
