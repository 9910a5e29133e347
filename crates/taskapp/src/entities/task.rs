//! Task entity and completion propagation.
//!
//! A task with subtasks is only completed while every subtask is. The
//! `*_at` methods take the current instant explicitly so the transitions can
//! be replayed deterministically; the plain variants use `Utc::now()`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Subtask;
use crate::errors::TasksError;
use crate::time;

/// Task status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Started,
    Paused,
    Completed,
}

impl TaskStatus {
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "started" | "start" | "in-progress" | "open" => Ok(Self::Started),
            "paused" | "pause" => Ok(Self::Paused),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            _ => Err(TasksError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Task priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(TasksError::InvalidPriority {
                priority: s.to_string(),
            }),
        }
    }
}

/// Effect a status change had on the parent task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Parent task status untouched
    #[default]
    Unchanged,
    /// Last open subtask closed; parent task completed
    ParentCompleted,
    /// Parent task moved back out of `Completed`
    ParentReopened,
}

/// Core task structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier within the owner's task list
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,

    /// Set while the task is completed
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "endedAt")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Deadline entered by the user; superseded by subtask deadlines
    #[serde(rename = "manualDeadline")]
    pub manual_deadline: DateTime<Utc>,

    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "createdAt"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "updatedAt"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task started now and due in one day
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            started_at: now,
            ended_at: None,
            manual_deadline: now + Duration::days(1),
            subtasks: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Latest subtask deadline, or the manual deadline when there are no subtasks
    pub fn effective_deadline(&self) -> DateTime<Utc> {
        self.subtasks
            .iter()
            .map(|s| s.deadline)
            .max()
            .unwrap_or(self.manual_deadline)
    }

    /// Time between start and end, once ended
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Duration as `HH:MM:SS`, or "N/A" while the task is open
    pub fn duration_display(&self) -> String {
        self.duration()
            .map_or_else(|| "N/A".to_string(), time::format_clock)
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// True when the task has subtasks and all of them are completed
    pub fn all_subtasks_completed(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(Subtask::is_completed)
    }

    /// Check if task may be marked as completed
    pub fn can_complete(&self) -> bool {
        self.subtasks.iter().all(Subtask::is_completed)
    }

    /// (completed, total) subtask counts
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.is_completed()).count();
        (done, self.subtasks.len())
    }

    /// Update task status with validation
    pub fn set_status(&mut self, status: TaskStatus) -> Result<(), TasksError> {
        self.set_status_at(status, Utc::now())
    }

    /// Update task status at `now`.
    ///
    /// Completing requires every subtask to be completed and stamps the end
    /// time; any other status clears it.
    pub fn set_status_at(&mut self, status: TaskStatus, now: DateTime<Utc>) -> Result<(), TasksError> {
        if status.is_completed() && !self.can_complete() {
            let (done, total) = self.subtask_progress();
            return Err(TasksError::CannotComplete {
                task_id: self.id.clone(),
                reason: format!("{} of {} subtasks are not completed", total - done, total),
            });
        }

        if status.is_completed() {
            self.complete(now);
        } else {
            self.status = status;
            self.ended_at = None;
            self.touch(now);
        }
        Ok(())
    }

    /// Update a subtask's status and propagate to this task
    pub fn set_subtask_status(
        &mut self,
        subtask_id: u32,
        status: TaskStatus,
    ) -> Result<Propagation, TasksError> {
        self.set_subtask_status_at(subtask_id, status, Utc::now())
    }

    /// Update a subtask's status at `now` and propagate to this task.
    ///
    /// Completing the last open subtask completes the task. Moving a subtask
    /// out of `Completed` reopens a completed task.
    pub fn set_subtask_status_at(
        &mut self,
        subtask_id: u32,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<Propagation, TasksError> {
        let task_id = self.id.clone();
        let subtask = self
            .get_subtask_mut(subtask_id)
            .ok_or_else(|| TasksError::SubtaskNotFound {
                task_id,
                subtask_id: subtask_id.to_string(),
            })?;

        let previous = subtask.apply_status(status, now);
        self.touch(now);

        if previous == status {
            return Ok(Propagation::Unchanged);
        }

        if status.is_completed() {
            if self.all_subtasks_completed() && !self.is_completed() {
                self.complete(now);
                return Ok(Propagation::ParentCompleted);
            }
        } else if previous.is_completed() && self.is_completed() {
            self.reopen(now);
            return Ok(Propagation::ParentReopened);
        }

        Ok(Propagation::Unchanged)
    }

    /// Get subtask by ID
    pub fn get_subtask(&self, subtask_id: u32) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    /// Get mutable subtask by ID
    pub fn get_subtask_mut(&mut self, subtask_id: u32) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == subtask_id)
    }

    /// Get next available subtask ID
    pub fn next_subtask_id(&self) -> u32 {
        self.subtasks.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    /// Add a subtask
    pub fn add_subtask(&mut self, subtask: Subtask) -> Propagation {
        self.add_subtask_at(subtask, Utc::now())
    }

    /// Add a subtask at `now`. An open subtask reopens a completed task.
    pub fn add_subtask_at(&mut self, mut subtask: Subtask, now: DateTime<Utc>) -> Propagation {
        subtask.parent_id.clone_from(&self.id);
        if subtask.is_completed() {
            subtask.ended_at.get_or_insert(now);
        }

        let open = !subtask.is_completed();
        self.subtasks.push(subtask);
        self.touch(now);

        if open && self.is_completed() {
            self.reopen(now);
            Propagation::ParentReopened
        } else {
            Propagation::Unchanged
        }
    }

    /// Remove a subtask by ID
    pub fn remove_subtask(&mut self, subtask_id: u32) -> Option<(Subtask, Propagation)> {
        self.remove_subtask_at(subtask_id, Utc::now())
    }

    /// Remove a subtask at `now`. If every remaining subtask is completed the
    /// task is completed too.
    pub fn remove_subtask_at(
        &mut self,
        subtask_id: u32,
        now: DateTime<Utc>,
    ) -> Option<(Subtask, Propagation)> {
        let idx = self.subtasks.iter().position(|s| s.id == subtask_id)?;
        let removed = self.subtasks.remove(idx);
        self.touch(now);

        let propagation = if self.all_subtasks_completed() && !self.is_completed() {
            self.complete(now);
            Propagation::ParentCompleted
        } else {
            Propagation::Unchanged
        };

        Some((removed, propagation))
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.ended_at.get_or_insert(now);
        self.touch(now);
    }

    fn reopen(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Started;
        self.ended_at = None;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}
