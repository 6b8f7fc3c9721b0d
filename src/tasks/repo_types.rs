use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Board column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    /// Columns in board order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Position of the column on the board.
    pub fn index(self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Todo" => Ok(TaskStatus::Todo),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Done" => Ok(TaskStatus::Done),
            other => anyhow::bail!("unknown task status: {other}"),
        }
    }
}

/// Task document as stored and as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignee: Option<Uuid>,
    pub due_date: Option<Date>,
}

/// Partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
}

impl TaskPatch {
    /// The patch a board move sends: only the new column.
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = self.assignee {
            task.assignee = Some(assignee);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
    }
}

/// Row shape in Postgres; status is stored as text.
#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub assignee: Option<Uuid>,
    pub due_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            project_id: r.project_id,
            title: r.title,
            description: r.description,
            status: r.status.parse()?,
            assignee: r.assignee,
            due_date: r.due_date,
            created_at: r.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"In Progress\"");
        let s: TaskStatus = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(s, TaskStatus::Done);
        assert!(serde_json::from_str::<TaskStatus>("\"Blocked\"").is_err());
        assert_eq!("In Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Write docs".into(),
            description: "README".into(),
            status: TaskStatus::Todo,
            assignee: None,
            due_date: Some(time::macros::date!(2024 - 05 - 01)),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["projectId"], serde_json::json!(task.project_id));
        assert_eq!(json["dueDate"], "2024-05-01");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("assignee").is_none());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut task = Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "a".into(),
            description: "b".into(),
            status: TaskStatus::Todo,
            assignee: None,
            due_date: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        TaskPatch::status_only(TaskStatus::Done).apply_to(&mut task);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "a");
        assert_eq!(task.description, "b");
    }
}
