//! Tasks domain facade.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::entities::{Propagation, Subtask, Task, TaskPriority, TaskStatus};
use crate::errors::{TasksError, TasksResult};
use crate::storage::Storage;

/// Reference to a task (`"3"`) or one of its subtasks (`"3.2"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Task(String),
    Subtask(String, u32),
}

impl std::str::FromStr for ItemRef {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || TasksError::InvalidId { id: s.to_string() };

        match s.split_once('.') {
            None if !s.is_empty() => Ok(Self::Task(s.to_string())),
            Some((task_id, sub_id)) if !task_id.is_empty() => {
                let sub_id = sub_id.parse::<u32>().map_err(|_| invalid())?;
                Ok(Self::Subtask(task_id.to_string(), sub_id))
            }
            _ => Err(invalid()),
        }
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task(id) => write!(f, "{id}"),
            Self::Subtask(id, sub) => write!(f, "{id}.{sub}"),
        }
    }
}

/// List view filter: title search plus optional priority/status
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title; empty matches everything
    pub query: String,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let query = self.query.trim().to_lowercase();
        (query.is_empty() || task.title.to_lowercase().contains(&query))
            && self.priority.map_or(true, |p| task.priority == p)
            && self.status.map_or(true, |s| task.status == s)
    }
}

/// Fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial edit of a task; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    /// `Some("")` clears the description
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Fields for a new subtask
#[derive(Debug, Clone, Default)]
pub struct NewSubtask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    /// Defaults to the start of today
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial edit of a subtask; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct SubtaskEdit {
    pub title: Option<String>,
    /// `Some("")` clears the description
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<DateTime<Utc>>,
}

fn require_title(title: &str) -> TasksResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TasksError::InvalidArgument {
            reason: "title is required".to_string(),
        });
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Tasks domain facade providing high-level task operations
pub struct TasksDomain {
    storage: Arc<dyn Storage>,
}

impl TasksDomain {
    /// Create a new tasks domain
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// List a user's tasks matching `filter`, in stored order
    pub async fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> TasksResult<Vec<Task>> {
        let tasks = self.storage.load_tasks(user_id).await?;
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    /// Get a specific task by ID
    pub async fn get_task(&self, user_id: &str, task_id: &str) -> TasksResult<Task> {
        self.storage
            .load_task(user_id, task_id)
            .await?
            .ok_or_else(|| TasksError::TaskNotFound {
                task_id: task_id.to_string(),
            })
    }

    /// Get a subtask by parent and subtask ID
    pub async fn get_subtask(
        &self,
        user_id: &str,
        task_id: &str,
        subtask_id: u32,
    ) -> TasksResult<Subtask> {
        let task = self.get_task(user_id, task_id).await?;
        task.get_subtask(subtask_id)
            .cloned()
            .ok_or_else(|| TasksError::SubtaskNotFound {
                task_id: task_id.to_string(),
                subtask_id: subtask_id.to_string(),
            })
    }

    /// Add a new task
    pub async fn add_task(&self, user_id: &str, new: NewTask) -> TasksResult<Task> {
        let title = require_title(&new.title)?;

        // ID is assigned by the store
        let mut task = Task::new(String::new(), title);
        task.description = normalize_description(new.description);
        if let Some(priority) = new.priority {
            task.priority = priority;
        }
        if let Some(deadline) = new.deadline {
            task.manual_deadline = deadline;
        }
        if let Some(status) = new.status {
            task.set_status(status)?;
        }

        let task = self.storage.insert_new_task(user_id, task).await?;
        info!(user_id, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Edit task fields. A status change goes through the completion rules.
    pub async fn update_task(&self, user_id: &str, task_id: &str, edit: TaskEdit) -> TasksResult<Task> {
        let title = edit.title.as_deref().map(require_title).transpose()?;

        let task = self
            .storage
            .update_task_with(user_id, task_id, &mut |task: &mut Task| {
                if let Some(title) = &title {
                    task.title.clone_from(title);
                }
                if let Some(description) = &edit.description {
                    task.description = normalize_description(Some(description.clone()));
                }
                if let Some(priority) = edit.priority {
                    task.priority = priority;
                }
                if let Some(deadline) = edit.deadline {
                    task.manual_deadline = deadline;
                }
                if let Some(status) = edit.status {
                    task.set_status(status)?;
                }
                task.updated_at = Some(Utc::now());
                Ok(())
            })
            .await?;

        debug!(user_id, task_id, "Task updated");
        Ok(task)
    }

    /// Update task status
    pub async fn set_task_status(
        &self,
        user_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> TasksResult<Task> {
        let task = self
            .storage
            .update_task_with(user_id, task_id, &mut |task: &mut Task| task.set_status(status))
            .await?;

        info!(user_id, task_id, %status, "Task status changed");
        Ok(task)
    }

    /// Remove a task and its subtasks
    pub async fn remove_task(&self, user_id: &str, task_id: &str) -> TasksResult<()> {
        self.storage.delete_task(user_id, task_id).await?;
        info!(user_id, task_id, "Task removed");
        Ok(())
    }

    /// Add a subtask to a task
    pub async fn add_subtask(
        &self,
        user_id: &str,
        task_id: &str,
        new: NewSubtask,
    ) -> TasksResult<(Subtask, Propagation)> {
        let title = require_title(&new.title)?;
        let description = normalize_description(new.description);
        let mut created = None;

        self.storage
            .update_task_with(user_id, task_id, &mut |task: &mut Task| {
                let mut subtask = Subtask::new(task.next_subtask_id(), task_id, title.clone());
                subtask.description.clone_from(&description);
                if let Some(status) = new.status {
                    subtask.status = status;
                }
                if let Some(deadline) = new.deadline {
                    subtask.deadline = deadline;
                }

                let id = subtask.id;
                let propagation = task.add_subtask(subtask);
                created = task.get_subtask(id).cloned().map(|s| (s, propagation));
                Ok(())
            })
            .await?;

        let (subtask, propagation) = created.ok_or_else(|| TasksError::Internal {
            reason: format!("subtask missing from task '{task_id}' after insert"),
        })?;

        info!(
            user_id,
            subtask = %subtask.full_id(),
            ?propagation,
            "Subtask created"
        );
        Ok((subtask, propagation))
    }

    /// Edit subtask fields. A status change propagates to the parent task.
    pub async fn update_subtask(
        &self,
        user_id: &str,
        task_id: &str,
        subtask_id: u32,
        edit: SubtaskEdit,
    ) -> TasksResult<Propagation> {
        let title = edit.title.as_deref().map(require_title).transpose()?;
        let mut propagation = Propagation::Unchanged;

        self.storage
            .update_task_with(user_id, task_id, &mut |task: &mut Task| {
                let subtask = task
                    .get_subtask_mut(subtask_id)
                    .ok_or_else(|| TasksError::SubtaskNotFound {
                        task_id: task_id.to_string(),
                        subtask_id: subtask_id.to_string(),
                    })?;

                if let Some(title) = &title {
                    subtask.title.clone_from(title);
                }
                if let Some(description) = &edit.description {
                    subtask.description = normalize_description(Some(description.clone()));
                }
                if let Some(deadline) = edit.deadline {
                    subtask.deadline = deadline;
                }
                subtask.updated_at = Some(Utc::now());

                if let Some(status) = edit.status {
                    propagation = task.set_subtask_status(subtask_id, status)?;
                }
                Ok(())
            })
            .await?;

        debug!(user_id, task_id, subtask_id, ?propagation, "Subtask updated");
        Ok(propagation)
    }

    /// Update a subtask's status and propagate it to the parent task
    pub async fn set_subtask_status(
        &self,
        user_id: &str,
        task_id: &str,
        subtask_id: u32,
        status: TaskStatus,
    ) -> TasksResult<Propagation> {
        let mut propagation = Propagation::Unchanged;

        self.storage
            .update_task_with(user_id, task_id, &mut |task: &mut Task| {
                propagation = task.set_subtask_status(subtask_id, status)?;
                Ok(())
            })
            .await?;

        info!(user_id, task_id, subtask_id, %status, ?propagation, "Subtask status changed");
        Ok(propagation)
    }

    /// Remove a subtask
    pub async fn remove_subtask(
        &self,
        user_id: &str,
        task_id: &str,
        subtask_id: u32,
    ) -> TasksResult<(Subtask, Propagation)> {
        let mut removed = None;

        self.storage
            .update_task_with(user_id, task_id, &mut |task: &mut Task| {
                removed = Some(task.remove_subtask(subtask_id).ok_or_else(|| {
                    TasksError::SubtaskNotFound {
                        task_id: task_id.to_string(),
                        subtask_id: subtask_id.to_string(),
                    }
                })?);
                Ok(())
            })
            .await?;

        let (subtask, propagation) = removed.ok_or_else(|| TasksError::Internal {
            reason: format!("subtask {task_id}.{subtask_id} vanished during removal"),
        })?;

        info!(user_id, subtask = %subtask.full_id(), ?propagation, "Subtask removed");
        Ok((subtask, propagation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    const USER: &str = "user-1";

    async fn setup() -> (TempDir, TasksDomain) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(temp_dir.path()));
        storage.initialize().await.unwrap();
        let domain = TasksDomain::new(storage);
        (temp_dir, domain)
    }

    fn titled(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    fn sub(title: &str) -> NewSubtask {
        NewSubtask {
            title: title.to_string(),
            ..NewSubtask::default()
        }
    }

    #[test]
    fn test_item_ref_parsing() {
        assert_eq!("3".parse::<ItemRef>().unwrap(), ItemRef::Task("3".into()));
        assert_eq!(
            "3.2".parse::<ItemRef>().unwrap(),
            ItemRef::Subtask("3".into(), 2)
        );
        assert_eq!(ItemRef::Subtask("3".into(), 2).to_string(), "3.2");
        assert!("3.x".parse::<ItemRef>().is_err());
        assert!(".2".parse::<ItemRef>().is_err());
        assert!("".parse::<ItemRef>().is_err());
    }

    #[tokio::test]
    async fn test_add_and_list_tasks() {
        let (_temp, domain) = setup().await;

        domain.add_task(USER, titled("Task 1")).await.unwrap();
        domain.add_task(USER, titled("Task 2")).await.unwrap();

        let tasks = domain.list_tasks(USER, &TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "1");
        assert_eq!(tasks[1].id, "2");
    }

    #[tokio::test]
    async fn test_add_task_requires_title() {
        let (_temp, domain) = setup().await;
        let err = domain.add_task(USER, titled("   ")).await.unwrap_err();
        assert!(matches!(err, TasksError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_add_completed_task_stamps_end() {
        let (_temp, domain) = setup().await;
        let task = domain
            .add_task(
                USER,
                NewTask {
                    title: "Done already".to_string(),
                    description: Some("  ".to_string()),
                    status: Some(TaskStatus::Completed),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();

        assert!(task.is_completed());
        assert!(task.ended_at.is_some());
        assert!(task.description.is_none());
    }

    #[tokio::test]
    async fn test_filtering() {
        let (_temp, domain) = setup().await;

        domain
            .add_task(
                USER,
                NewTask {
                    title: "Buy groceries".to_string(),
                    priority: Some(TaskPriority::High),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
        domain
            .add_task(
                USER,
                NewTask {
                    title: "Read book".to_string(),
                    priority: Some(TaskPriority::Low),
                    status: Some(TaskStatus::Paused),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();

        let by_query = TaskFilter {
            query: "GROCER".to_string(),
            ..TaskFilter::default()
        };
        let found = domain.list_tasks(USER, &by_query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Buy groceries");

        let by_status = TaskFilter {
            status: Some(TaskStatus::Paused),
            ..TaskFilter::default()
        };
        let found = domain.list_tasks(USER, &by_status).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Read book");

        let none = TaskFilter {
            query: "book".to_string(),
            priority: Some(TaskPriority::High),
            status: None,
        };
        assert!(domain.list_tasks(USER, &none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_task_fields() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Draft")).await.unwrap();

        let updated = domain
            .update_task(
                USER,
                &task.id,
                TaskEdit {
                    title: Some("Final".to_string()),
                    description: Some("notes".to_string()),
                    priority: Some(TaskPriority::High),
                    ..TaskEdit::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description.as_deref(), Some("notes"));
        assert_eq!(updated.priority, TaskPriority::High);

        let cleared = domain
            .update_task(
                USER,
                &task.id,
                TaskEdit {
                    description: Some(String::new()),
                    ..TaskEdit::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.description.is_none());
    }

    #[tokio::test]
    async fn test_subtask_completion_propagates() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Trip")).await.unwrap();

        let (first, _) = domain.add_subtask(USER, &task.id, sub("Book flight")).await.unwrap();
        let (second, _) = domain.add_subtask(USER, &task.id, sub("Pack")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.full_id(), format!("{}.2", task.id));

        let outcome = domain
            .set_subtask_status(USER, &task.id, 1, TaskStatus::Completed)
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::Unchanged);

        let outcome = domain
            .set_subtask_status(USER, &task.id, 2, TaskStatus::Completed)
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::ParentCompleted);

        let stored = domain.get_task(USER, &task.id).await.unwrap();
        assert!(stored.is_completed());
        assert!(stored.ended_at.is_some());

        let outcome = domain
            .set_subtask_status(USER, &task.id, 1, TaskStatus::Started)
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::ParentReopened);

        let stored = domain.get_task(USER, &task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Started);
        assert!(stored.ended_at.is_none());
    }

    #[tokio::test]
    async fn test_cannot_complete_task_with_open_subtask() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Trip")).await.unwrap();
        domain.add_subtask(USER, &task.id, sub("Pack")).await.unwrap();

        let err = domain
            .set_task_status(USER, &task.id, TaskStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, TasksError::CannotComplete { .. }));

        let stored = domain.get_task(USER, &task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Started);
    }

    #[tokio::test]
    async fn test_update_subtask_edits_and_propagates() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Trip")).await.unwrap();
        domain.add_subtask(USER, &task.id, sub("Pack")).await.unwrap();

        let outcome = domain
            .update_subtask(
                USER,
                &task.id,
                1,
                SubtaskEdit {
                    title: Some("Pack bags".to_string()),
                    status: Some(TaskStatus::Completed),
                    ..SubtaskEdit::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::ParentCompleted);

        let subtask = domain.get_subtask(USER, &task.id, 1).await.unwrap();
        assert_eq!(subtask.title, "Pack bags");
        assert!(subtask.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_add_subtask_to_completed_task_reopens() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Trip")).await.unwrap();
        domain
            .set_task_status(USER, &task.id, TaskStatus::Completed)
            .await
            .unwrap();

        let (_, outcome) = domain.add_subtask(USER, &task.id, sub("Forgot this")).await.unwrap();
        assert_eq!(outcome, Propagation::ParentReopened);
        assert!(!domain.get_task(USER, &task.id).await.unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_remove_subtask() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Trip")).await.unwrap();
        domain.add_subtask(USER, &task.id, sub("Pack")).await.unwrap();
        domain.add_subtask(USER, &task.id, sub("Cancel hotel")).await.unwrap();
        domain
            .set_subtask_status(USER, &task.id, 1, TaskStatus::Completed)
            .await
            .unwrap();

        let (removed, outcome) = domain.remove_subtask(USER, &task.id, 2).await.unwrap();
        assert_eq!(removed.title, "Cancel hotel");
        assert_eq!(outcome, Propagation::ParentCompleted);

        let err = domain.remove_subtask(USER, &task.id, 2).await.unwrap_err();
        assert!(matches!(err, TasksError::SubtaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_task() {
        let (_temp, domain) = setup().await;
        let task = domain.add_task(USER, titled("Temp")).await.unwrap();

        domain.remove_task(USER, &task.id).await.unwrap();
        let err = domain.get_task(USER, &task.id).await.unwrap_err();
        assert!(matches!(err, TasksError::TaskNotFound { .. }));
    }
}
