//! Error types for the taskapp crate.

use thiserror::Error;

/// Errors raised by task management, authentication and storage
#[derive(Error, Debug, Clone)]
pub enum TasksError {
    // Task errors
    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Subtask '{subtask_id}' not found in task '{task_id}'")]
    SubtaskNotFound { task_id: String, subtask_id: String },

    #[error("Task '{task_id}' cannot be completed: {reason}")]
    CannotComplete { task_id: String, reason: String },

    #[error("Invalid status: '{status}'")]
    InvalidStatus { status: String },

    #[error("Invalid priority: '{priority}'")]
    InvalidPriority { priority: String },

    #[error("Invalid ID format: '{id}'")]
    InvalidId { id: String },

    #[error("Invalid date '{value}': expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDate { value: String },

    // Authentication errors
    #[error("Not logged in. Run 'taskapp login' first.")]
    NotAuthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email '{email}' is already registered")]
    EmailAlreadyRegistered { email: String },

    #[error("Password must be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    // Storage errors
    #[error("Storage error: {reason}")]
    StorageError { reason: String },

    #[error("Failed to read file '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    // Notification errors
    #[error("Notification channel '{channel}' failed: {reason}")]
    ChannelError { channel: String, reason: String },

    // General errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl From<std::io::Error> for TasksError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TasksError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for taskapp operations
pub type TasksResult<T> = Result<T, TasksError>;
