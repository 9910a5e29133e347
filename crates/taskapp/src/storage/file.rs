//! File-based storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::traits::{Storage, TaskMutation, UsersMutation};
use crate::entities::{Session, Task, User};
use crate::errors::{TasksError, TasksResult};

const FORMAT_VERSION: &str = "1.0.0";

/// File-based storage rooted at a data directory.
///
/// ```text
/// <root>/users.json
/// <root>/session.json
/// <root>/tasks/<user-id>.json
/// ```
pub struct FileStorage {
    root: PathBuf,

    /// Per-user task documents
    tasks_dir: PathBuf,

    users_file: PathBuf,

    session_file: PathBuf,

    /// Serialises every read-modify-write
    write_lock: Mutex<()>,
}

/// On-disk shape of one user's task list
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(default)]
    tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<TaskListMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskListMetadata {
    version: String,
    #[serde(rename = "lastModified")]
    last_modified: DateTime<Utc>,
    #[serde(rename = "taskCount")]
    task_count: usize,
    #[serde(rename = "completedCount")]
    completed_count: usize,
}

impl TaskListMetadata {
    fn for_tasks(tasks: &[Task]) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            last_modified: Utc::now(),
            task_count: tasks.len(),
            completed_count: tasks.iter().filter(|t| t.is_completed()).count(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserDocument {
    #[serde(default)]
    users: Vec<User>,
}

impl FileStorage {
    /// Create a new file storage instance rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            tasks_dir: root.join("tasks"),
            users_file: root.join("users.json"),
            session_file: root.join("session.json"),
            root,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the data directory
    fn tasks_file(&self, user_id: &str) -> TasksResult<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(TasksError::InvalidId {
                id: user_id.to_string(),
            });
        }
        Ok(self.tasks_dir.join(format!("{user_id}.json")))
    }

    /// Read a JSON file, treating a missing file as the default value
    async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> TasksResult<T> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(TasksError::FileReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Write a JSON file via a sibling temp file so readers never see a torn write
    async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> TasksResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        let write_err = |e: std::io::Error| TasksError::FileWriteError {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        fs::write(&tmp, content).await.map_err(write_err)?;
        fs::rename(&tmp, path).await.map_err(write_err)
    }

    async fn read_tasks(&self, user_id: &str) -> TasksResult<Vec<Task>> {
        let path = self.tasks_file(user_id)?;
        let doc: TaskDocument = Self::read_json(&path).await?;
        Ok(doc.tasks)
    }

    /// One past the highest numeric task ID
    fn next_task_id(tasks: &[Task]) -> String {
        let max_id = tasks
            .iter()
            .filter_map(|t| t.id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        (max_id + 1).to_string()
    }

    /// Caller must hold `write_lock`
    async fn write_tasks(&self, user_id: &str, tasks: &[Task]) -> TasksResult<()> {
        let path = self.tasks_file(user_id)?;
        let doc = TaskDocument {
            tasks: tasks.to_vec(),
            metadata: Some(TaskListMetadata::for_tasks(tasks)),
        };
        Self::write_json(&path, &doc).await?;
        debug!(user_id, task_count = tasks.len(), "Tasks saved");
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> TasksResult<()> {
        fs::create_dir_all(&self.tasks_dir).await?;

        if !self.users_file.exists() {
            Self::write_json(&self.users_file, &UserDocument::default()).await?;
        }

        if !self.session_file.exists() {
            Self::write_json(&self.session_file, &Session::default()).await?;
        }

        debug!(root = %self.root.display(), "File storage initialized");
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "file"
    }

    async fn is_initialized(&self) -> TasksResult<bool> {
        Ok(self.tasks_dir.exists() && self.users_file.exists())
    }

    async fn load_tasks(&self, user_id: &str) -> TasksResult<Vec<Task>> {
        self.read_tasks(user_id).await
    }

    async fn load_task(&self, user_id: &str, task_id: &str) -> TasksResult<Option<Task>> {
        let tasks = self.read_tasks(user_id).await?;
        Ok(tasks.into_iter().find(|t| t.id == task_id))
    }

    async fn save_tasks(&self, user_id: &str, tasks: &[Task]) -> TasksResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_tasks(user_id, tasks).await
    }

    async fn add_task(&self, user_id: &str, task: Task) -> TasksResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks(user_id).await?;

        if tasks.iter().any(|t| t.id == task.id) {
            return Err(TasksError::InvalidArgument {
                reason: format!("task '{}' already exists", task.id),
            });
        }

        tasks.push(task);
        self.write_tasks(user_id, &tasks).await
    }

    async fn insert_new_task(&self, user_id: &str, mut task: Task) -> TasksResult<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks(user_id).await?;

        task.id = Self::next_task_id(&tasks);
        for subtask in &mut task.subtasks {
            subtask.parent_id.clone_from(&task.id);
        }

        tasks.push(task.clone());
        self.write_tasks(user_id, &tasks).await?;
        Ok(task)
    }

    async fn update_task(&self, user_id: &str, task: &Task) -> TasksResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks(user_id).await?;

        if let Some(idx) = tasks.iter().position(|t| t.id == task.id) {
            tasks[idx] = task.clone();
            self.write_tasks(user_id, &tasks).await
        } else {
            Err(TasksError::TaskNotFound {
                task_id: task.id.clone(),
            })
        }
    }

    async fn update_task_with(
        &self,
        user_id: &str,
        task_id: &str,
        mutation: TaskMutation<'_>,
    ) -> TasksResult<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks(user_id).await?;

        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| TasksError::TaskNotFound {
                task_id: task_id.to_string(),
            })?;

        // Edit a copy so a failed mutation leaves the stored task untouched
        let mut edited = slot.clone();
        if let Err(e) = mutation(&mut edited) {
            warn!(user_id, task_id, error = %e, "Task update rejected");
            return Err(e);
        }
        edited.id = task_id.to_string();
        *slot = edited.clone();

        self.write_tasks(user_id, &tasks).await?;
        Ok(edited)
    }

    async fn delete_task(&self, user_id: &str, task_id: &str) -> TasksResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks(user_id).await?;
        let len_before = tasks.len();
        tasks.retain(|t| t.id != task_id);

        if tasks.len() == len_before {
            return Err(TasksError::TaskNotFound {
                task_id: task_id.to_string(),
            });
        }

        self.write_tasks(user_id, &tasks).await
    }

    async fn load_users(&self) -> TasksResult<Vec<User>> {
        let doc: UserDocument = Self::read_json(&self.users_file).await?;
        Ok(doc.users)
    }

    async fn update_users_with(&self, mutation: UsersMutation<'_>) -> TasksResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut doc: UserDocument = Self::read_json(&self.users_file).await?;

        if let Err(e) = mutation(&mut doc.users) {
            debug!(error = %e, "Account update rejected");
            return Err(e);
        }

        Self::write_json(&self.users_file, &doc).await
    }

    async fn load_session(&self) -> TasksResult<Session> {
        Self::read_json(&self.session_file).await
    }

    async fn save_session(&self, session: &Session) -> TasksResult<()> {
        let _guard = self.write_lock.lock().await;
        Self::write_json(&self.session_file, session).await
    }
}
