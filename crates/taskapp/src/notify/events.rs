//! Deadline reminder events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::Task;
use crate::time;

/// Something whose deadline falls on the current day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeadlineEvent {
    TaskDueToday {
        task_id: String,
        title: String,
    },

    SubtaskDueToday {
        task_id: String,
        subtask_id: u32,
        title: String,
        parent_title: String,
    },
}

impl DeadlineEvent {
    /// Stable identity used to avoid repeating a reminder within a day
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::TaskDueToday { task_id, .. } => format!("task_{task_id}"),
            Self::SubtaskDueToday {
                task_id,
                subtask_id,
                ..
            } => format!("sub_{task_id}_{subtask_id}"),
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::TaskDueToday { title, .. } => format!("Task due today: {title}"),
            Self::SubtaskDueToday { title, .. } => format!("Subtask due today: {title}"),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::TaskDueToday { task_id, title } => {
                format!("Task #{task_id} \"{title}\" reaches its deadline today")
            }
            Self::SubtaskDueToday {
                task_id,
                subtask_id,
                title,
                parent_title,
            } => format!(
                "Subtask #{task_id}.{subtask_id} \"{title}\" of \"{parent_title}\" reaches its deadline today"
            ),
        }
    }
}

/// Collect reminders for every open task and subtask due on `today`.
///
/// Tasks are matched on their manual deadline, subtasks on their own
/// deadline. A subtask can be due even when its parent is not.
#[must_use]
pub fn due_today(tasks: &[Task], today: NaiveDate) -> Vec<DeadlineEvent> {
    let mut events = Vec::new();

    for task in tasks {
        if !task.is_completed() && time::local_date(task.manual_deadline) == today {
            events.push(DeadlineEvent::TaskDueToday {
                task_id: task.id.clone(),
                title: task.title.clone(),
            });
        }

        for subtask in &task.subtasks {
            if subtask.is_completed() || time::local_date(subtask.deadline) != today {
                continue;
            }
            events.push(DeadlineEvent::SubtaskDueToday {
                task_id: task.id.clone(),
                subtask_id: subtask.id,
                title: subtask.title.clone(),
                parent_title: task.title.clone(),
            });
        }
    }

    events
}
