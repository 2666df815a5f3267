//! Structured error types for task operations and their collaborators.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Rejected locally, nothing sent to the store
    ValidationError,
    BlockedByDependency,
    HasDependents,
    CyclicDependency,
    NotSignedIn,

    // Not found errors
    NotFound,

    // Remote failures
    Conflict,
    StoreError,
    AuthError,
}

/// Structured error for task operations.
#[derive(Debug, Serialize)]
pub struct TaskError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TaskError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, reason).with_field(field)
    }

    pub fn not_found(task_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {}", task_id))
    }

    pub fn blocked_by(prerequisites: &[String]) -> Self {
        Self::new(
            ErrorCode::BlockedByDependency,
            format!(
                "Please complete the following tasks first: {}",
                prerequisites.join(", ")
            ),
        )
        .with_details(prerequisites.join("\n"))
    }

    pub fn has_dependents(dependents: &[String]) -> Self {
        Self::new(
            ErrorCode::HasDependents,
            format!(
                "Cannot delete this task as it is required by: {}",
                dependents.join(", ")
            ),
        )
    }

    pub fn cyclic_dependency(task_id: &str, dependency_id: &str) -> Self {
        Self::new(
            ErrorCode::CyclicDependency,
            format!(
                "Making {} depend on {} would create a cycle",
                task_id, dependency_id
            ),
        )
        .with_field("dependencies")
    }

    pub fn not_signed_in() -> Self {
        Self::new(ErrorCode::NotSignedIn, "Sign in to manage tasks")
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(ref id) => Self::not_found(id),
            StoreError::Conflict(ref id) => Self::new(
                ErrorCode::Conflict,
                format!("Task {} changed before the update was applied", id),
            ),
            other => Self::new(ErrorCode::StoreError, other.to_string()),
        }
    }
}

impl From<AuthError> for TaskError {
    fn from(err: AuthError) -> Self {
        Self::new(ErrorCode::AuthError, err.to_string())
    }
}

/// Failures reported by a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Precondition failed for document {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by an identity provider.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credentials configured for sign-in")]
    NoCredentials,

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Could not persist session: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read session: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for task operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;
