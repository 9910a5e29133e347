#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::map_unwrap_or)]

//! # taskapp
//!
//! Personal task tracking with subtasks and deadline reminders.
//!
//! This crate provides:
//! - Tasks and subtasks whose statuses keep each other consistent
//!   (completing the last open subtask completes the task, reopening a
//!   subtask reopens the task)
//! - Per-user JSON storage with a local account and session store
//! - Due-today reminders delivered through pluggable channels
//! - A CLI front end
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskapp::{FileStorage, TasksDomain, TaskStatus};
//! use taskapp::domain::{NewSubtask, NewTask};
//!
//! let storage = Arc::new(FileStorage::new("/tmp/taskapp"));
//! let domain = TasksDomain::new(storage);
//!
//! let task = domain.add_task(&user_id, NewTask { title: "Report".into(), ..Default::default() }).await?;
//! domain.add_subtask(&user_id, &task.id, NewSubtask { title: "Charts".into(), ..Default::default() }).await?;
//! domain.set_subtask_status(&user_id, &task.id, 1, TaskStatus::Completed).await?;
//! // The task is now completed as well
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Storage layer
pub mod storage;

// Domain facades
pub mod domain;

// Deadline reminders
pub mod notify;

// Local-day helpers and duration formatting
pub mod time;

// Terminal UI helpers
pub mod ui;

// Re-export key types for convenience
pub use domain::{AuthDomain, ConfigDomain, TasksDomain};
pub use entities::{AppConfig, Propagation, Subtask, Task, TaskPriority, TaskStatus, User};
pub use errors::{TasksError, TasksResult};
pub use storage::{FileStorage, Storage};
