//! Task domain model.
//!
//! # Responsibility
//! - Define the single domain entity rendered by the task list.
//! - Validate write-time invariants before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is never blank once persisted.
//! - `priority` outside `0..=2` is preserved and labelled `Unknown`.
//!
//! Editable fields of a completed task are frozen by the presentation layer
//! only; nothing here enforces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable task identifier. Opaque text so externally created ids round-trip.
pub type TaskId = String;

/// Priority ordinal, kept open-ended so out-of-range stored values survive.
/// Defaults to `LOW`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(pub i64);

impl Priority {
    pub const LOW: Self = Self(0);
    pub const MEDIUM: Self = Self(1);
    pub const HIGH: Self = Self(2);

    pub fn ordinal(self) -> i64 {
        self.0
    }

    /// Display label; never fails for unknown ordinals.
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "Low",
            1 => "Medium",
            2 => "High",
            _ => "Unknown",
        }
    }

    pub fn is_known(self) -> bool {
        (0..=2).contains(&self.0)
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation error for task write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyId,
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "task id must not be empty"),
            Self::EmptyTitle => write!(f, "task title must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// A user-created unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Free text, empty when the user left it blank.
    pub description: String,
    /// Only the date part is displayed; the time part is kept as stored.
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub is_completed: bool,
}

impl Task {
    /// Creates a not-completed task with a freshly generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title)
    }

    /// Creates a not-completed task with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::LOW,
            is_completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a copy with `is_completed` flipped; identity is unchanged.
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Whether the due date lies strictly after `now`.
    pub fn is_due_after(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due > now)
    }

    /// Validates write-time invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }
}
