//! Core data structures for task management.

mod config;
mod subtask;
mod task;
mod user;

pub use config::{AppConfig, NotificationConfig, TaskDefaults, ThemeConfig};
pub use subtask::Subtask;
pub use task::{Propagation, Task, TaskPriority, TaskStatus};
pub use user::{Session, User};
