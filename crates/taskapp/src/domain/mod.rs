//! Domain facades over the storage layer.
//!
//! Each facade owns the business rules for one area and is what the CLI
//! talks to; none of them touch the filesystem layout directly except
//! [`ConfigDomain`].

mod auth;
mod config;
mod tasks;

pub use auth::{AuthDomain, MIN_PASSWORD_LEN};
pub use config::ConfigDomain;
pub use tasks::{ItemRef, NewSubtask, NewTask, SubtaskEdit, TaskEdit, TaskFilter, TasksDomain};
