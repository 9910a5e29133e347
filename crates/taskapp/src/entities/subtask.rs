//! Subtask entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::task::TaskStatus;
use crate::time;

/// Subtask structure (nested within tasks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// Numeric ID within parent task
    pub id: u32,

    /// Parent task ID
    #[serde(rename = "parentId")]
    pub parent_id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    /// Due day; defaults to local midnight of the creation day
    pub deadline: DateTime<Utc>,

    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,

    /// Set while the subtask is completed
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "endedAt")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "updatedAt"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subtask {
    /// Create a new subtask started now and due today
    pub fn new(id: u32, parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: parent_id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            deadline: time::start_of_today(),
            started_at: now,
            ended_at: None,
            updated_at: Some(now),
        }
    }

    /// Get full ID (parentId.subtaskId format)
    pub fn full_id(&self) -> String {
        format!("{}.{}", self.parent_id, self.id)
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Change status, keeping `ended_at` in step. Returns the previous status.
    ///
    /// Completing stamps the end time unless one is already recorded;
    /// leaving `Completed` clears it.
    pub fn apply_status(&mut self, status: TaskStatus, now: DateTime<Utc>) -> TaskStatus {
        let previous = self.status;

        if status.is_completed() {
            self.ended_at.get_or_insert(now);
        } else if previous.is_completed() {
            self.ended_at = None;
        }

        self.status = status;
        self.updated_at = Some(now);
        previous
    }

    /// Time between start and end, once ended
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Human readable duration ("3 days", "N/A" while open)
    pub fn duration_display(&self) -> String {
        self.duration()
            .map_or_else(|| "N/A".to_string(), time::format_human)
    }
}
