//! Storage trait definitions.

use async_trait::async_trait;

use crate::entities::{Session, Task, User};
use crate::errors::TasksResult;

/// In-place edit applied to a single task inside [`Storage::update_task_with`]
pub type TaskMutation<'a> = &'a mut (dyn FnMut(&mut Task) -> TasksResult<()> + Send);

/// In-place edit of the account list inside [`Storage::update_users_with`]
pub type UsersMutation<'a> = &'a mut (dyn FnMut(&mut Vec<User>) -> TasksResult<()> + Send);

/// Storage interface for task persistence.
///
/// Task lists are scoped per user. Implementations must serialise writers so
/// that [`Storage::update_task_with`] behaves as a read-modify-write
/// transaction on one task.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize storage (create directories, etc.)
    async fn initialize(&self) -> TasksResult<()>;

    /// Get storage type identifier
    fn storage_type(&self) -> &'static str;

    /// Check if storage is initialized
    async fn is_initialized(&self) -> TasksResult<bool>;

    // === Task Operations ===

    /// Load all tasks owned by a user
    async fn load_tasks(&self, user_id: &str) -> TasksResult<Vec<Task>>;

    /// Load a single task by ID
    async fn load_task(&self, user_id: &str, task_id: &str) -> TasksResult<Option<Task>>;

    /// Replace a user's task list
    async fn save_tasks(&self, user_id: &str, tasks: &[Task]) -> TasksResult<()>;

    /// Append a task under its own ID
    async fn add_task(&self, user_id: &str, task: Task) -> TasksResult<()>;

    /// Assign the next free numeric ID to `task` and append it, as one step.
    /// Returns the stored task.
    async fn insert_new_task(&self, user_id: &str, task: Task) -> TasksResult<Task>;

    /// Overwrite a single task, matched by its ID
    async fn update_task(&self, user_id: &str, task: &Task) -> TasksResult<()>;

    /// Load, edit and save one task atomically. Nothing is written when the
    /// mutation fails. Returns the saved task.
    async fn update_task_with(
        &self,
        user_id: &str,
        task_id: &str,
        mutation: TaskMutation<'_>,
    ) -> TasksResult<Task>;

    /// Delete a task
    async fn delete_task(&self, user_id: &str, task_id: &str) -> TasksResult<()>;

    // === Account Operations ===

    async fn load_users(&self) -> TasksResult<Vec<User>>;

    /// Load, edit and save the account list atomically. Nothing is written
    /// when the mutation fails.
    async fn update_users_with(&self, mutation: UsersMutation<'_>) -> TasksResult<()>;

    async fn load_session(&self) -> TasksResult<Session>;

    async fn save_session(&self, session: &Session) -> TasksResult<()>;
}
