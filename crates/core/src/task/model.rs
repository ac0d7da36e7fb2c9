//! Task model definitions

use serde::{Deserialize, Serialize};

/// Store-assigned task identifier
pub type TaskId = i64;

/// Version every freshly inserted row starts at
pub const INITIAL_VERSION: i64 = 1;

/// A stored task
///
/// `version` is the optimistic concurrency token the store bumps on every
/// replace. It never leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(skip)]
    pub version: i64,
}

impl Task {
    /// Replace every mutable field with the draft's values
    ///
    /// `id` and `version` are left alone so the store can detect
    /// concurrent writers.
    pub fn apply(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.is_completed = draft.is_completed;
    }
}

/// Field values for a task that has no id yet, or for a full replacement
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl TaskDraft {
    /// Create a new draft with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the completion flag
    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = is_completed;
        self
    }

    /// Turn the draft into a stored record once the store has assigned an id
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            version: INITIAL_VERSION,
        }
    }
}
