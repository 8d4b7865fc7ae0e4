//! Task models as served by the task service

use auth::Profile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod draft;

pub use draft::{NewTask, TaskDraft, TaskPatch};

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sender: Profile,
    #[serde(default)]
    pub recipient: Option<Profile>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub files: Vec<TaskFile>,
}

impl Task {
    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.recipient
            .as_ref()
            .is_some_and(|recipient| recipient.email == email)
    }
}

/// Attachment metadata, read-only on the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFile {
    pub id: i64,
    pub file: String,
    /// Absolute download URL, when the service could build one
    #[serde(default)]
    pub file_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
