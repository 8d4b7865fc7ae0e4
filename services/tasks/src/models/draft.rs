//! Payloads for creating and editing tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskFile;

/// A task as filled in by a form
///
/// May carry server-managed fields copied from an existing task; those are
/// dropped by [`TaskDraft::into_new_task`] and never sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Email of the user the task is addressed to
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default)]
    pub files: Option<Vec<TaskFile>>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_recipient(mut self, email: impl Into<String>) -> Self {
        self.recipient_email = Some(email.into());
        self
    }

    /// Body for the create call
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            name: self.name,
            description: self.description,
            recipient_email: self.recipient_email,
        }
    }
}

/// Request body for task creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
}

/// Partial update of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
