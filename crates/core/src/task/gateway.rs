//! Persistence gateway trait
//!
//! The narrow set of store primitives the repository is built on.

use async_trait::async_trait;

use super::model::{Task, TaskDraft, TaskId};
use crate::Result;

/// Result of a write keyed on id and expected version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
    /// The write went through
    Applied(T),
    /// The row exists but its version no longer matches
    Conflict,
    /// No row with that id
    Absent,
}

/// Storage primitives for a single record type keyed by integer id
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Fetch one row, `None` if absent
    async fn fetch_by_id(&self, id: TaskId) -> Result<Option<Task>>;

    /// Fetch every row in store order
    async fn fetch_all(&self) -> Result<Vec<Task>>;

    /// Insert a new row and return it with its assigned id
    async fn insert(&self, draft: &TaskDraft) -> Result<Task>;

    /// Overwrite the mutable fields of the row matching `task.id` and `task.version`
    async fn replace(&self, task: &Task) -> Result<WriteOutcome<Task>>;

    /// Delete the row matching `id` and `version`
    async fn delete(&self, id: TaskId, version: i64) -> Result<WriteOutcome<()>>;
}
