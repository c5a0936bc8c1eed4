//! Task record, board columns and input validation.
//!
//! # Invariants
//! - `title` and `description` are stored trimmed and never blank.
//! - `status` always names exactly one board column.
//! - Every local mutation leaves `synced == false`; only an acknowledged
//!   push flips it back.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a task, shared with the remote authority.
pub type TaskId = Uuid;

/// Task priority shown on the card footer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    #[default]
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Case-insensitive parse of `HIGH|MEDIUM|LOW`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Board column a task lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Columns in board display order.
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Done => "done",
        }
    }

    /// Parses the wire name. `in_progress` and `in-progress` are accepted
    /// as shell-friendly aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "todo" => Some(Self::Todo),
            "inProgress" | "in_progress" | "in-progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Error returned by `FromStr` for `Priority` and `TaskStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.field, self.value)
    }
}

impl Error for UnknownVariant {}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownVariant {
            field: "priority",
            value: s.to_string(),
        })
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownVariant {
            field: "status",
            value: s.to_string(),
        })
    }
}

/// User-correctable input error. Blocks the operation before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingTitle,
    MissingDescription,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "missing title"),
            Self::MissingDescription => write!(f, "missing description"),
        }
    }
}

impl Error for ValidationError {}

/// Validated, trimmed user-editable fields of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContent {
    title: String,
    description: String,
    priority: Priority,
}

impl TaskContent {
    /// Trims and validates user input.
    ///
    /// # Errors
    /// - `MissingTitle` when `title` is empty after trimming (checked first).
    /// - `MissingDescription` when `description` is empty after trimming.
    pub fn new(title: &str, description: &str, priority: Priority) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            priority,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

/// Canonical task record, also the JSON payload pushed to the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Tombstone; the record stays in the store until the delete is pushed.
    pub deleted: bool,
    /// `false` while the local copy carries an unacknowledged mutation.
    pub synced: bool,
}

impl Task {
    /// Builds a fresh, unsynced task with a generated id.
    pub fn new(status: TaskStatus, content: TaskContent) -> Self {
        Self::with_id(Uuid::new_v4(), status, content)
    }

    /// Builds an unsynced task with a caller-provided id.
    pub fn with_id(id: TaskId, status: TaskStatus, content: TaskContent) -> Self {
        Self {
            id,
            title: content.title,
            description: content.description,
            priority: content.priority,
            status,
            deleted: false,
            synced: false,
        }
    }

    /// Overwrites the editable fields, keeping id and column.
    pub fn apply_content(&mut self, content: &TaskContent) {
        self.title.clone_from(&content.title);
        self.description.clone_from(&content.description);
        self.priority = content.priority;
        self.synced = false;
    }

    /// Re-checks the text invariants on an already-built record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        TaskContent::new(&self.title, &self.description, self.priority).map(|_| ())
    }

    /// Returns whether this task is visible on the board.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskContent, TaskStatus, ValidationError};

    #[test]
    fn content_trims_and_rejects_blank_fields() {
        let content = TaskContent::new("  Buy milk ", "\t2%\n", Priority::Low).unwrap();
        assert_eq!(content.title(), "Buy milk");
        assert_eq!(content.description(), "2%");

        assert_eq!(
            TaskContent::new("   ", "desc", Priority::Low).unwrap_err(),
            ValidationError::MissingTitle
        );
        assert_eq!(
            TaskContent::new("title", " \n ", Priority::Low).unwrap_err(),
            ValidationError::MissingDescription
        );
        assert_eq!(
            TaskContent::new("", "", Priority::Low).unwrap_err(),
            ValidationError::MissingTitle
        );
    }

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(ValidationError::MissingTitle.to_string(), "missing title");
        assert_eq!(
            ValidationError::MissingDescription.to_string(),
            "missing description"
        );
    }

    #[test]
    fn new_task_starts_unsynced_and_live() {
        let content = TaskContent::new("a", "b", Priority::Medium).unwrap();
        let task = Task::new(TaskStatus::Done, content);
        assert_eq!(task.status, TaskStatus::Done);
        assert!(!task.synced);
        assert!(task.is_active());
    }

    #[test]
    fn task_serializes_with_wire_names() {
        let content = TaskContent::new("a", "b", Priority::High).unwrap();
        let task = Task::new(TaskStatus::InProgress, content);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "inProgress");
        assert_eq!(json["priority"], "HIGH");
        assert_eq!(json["deleted"], false);
        assert_eq!(json["id"], task.id.to_string());
    }

    #[test]
    fn status_parse_accepts_aliases() {
        assert_eq!(TaskStatus::parse("inProgress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("later"), None);
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
