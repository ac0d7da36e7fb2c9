//! Task repository
//!
//! The domain-facing seam over storage. Callers depend on [`TaskRepository`]
//! and never on a concrete store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::gateway::{TaskGateway, WriteOutcome};
use super::model::{Task, TaskDraft, TaskId};
use crate::{Error, Result};

/// Repository interface for task CRUD operations
///
/// Every failure is surfaced as an [`Error`] variant. Nothing is retried.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Get a task by ID, `Error::NotFound` if there is none
    async fn get_by_id(&self, id: TaskId) -> Result<Task>;

    /// Get all tasks in store order
    ///
    /// Returns `Error::Cancelled` instead of partial results once `cancel` fires.
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Task>>;

    /// Validate and insert a new task, returning it with its assigned id
    async fn add(&self, draft: TaskDraft) -> Result<Task>;

    /// Replace the mutable fields of an existing task
    async fn update(&self, task: Task) -> Result<Task>;

    /// Delete the task with the given id
    async fn remove(&self, task: &Task) -> Result<()>;
}

/// Repository backed by a persistence gateway
#[derive(Clone)]
pub struct StoreTaskRepository {
    gateway: Arc<dyn TaskGateway>,
}

impl StoreTaskRepository {
    pub fn new(gateway: Arc<dyn TaskGateway>) -> Self {
        Self { gateway }
    }
}

fn conflict(id: TaskId) -> Error {
    Error::Conflict(format!("Task {} was modified concurrently", id))
}

#[async_trait]
impl TaskRepository for StoreTaskRepository {
    async fn get_by_id(&self, id: TaskId) -> Result<Task> {
        self.gateway
            .fetch_by_id(id)
            .await?
            .ok_or(Error::NotFound(id))
    }

    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Task>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            tasks = self.gateway.fetch_all() => tasks,
        }
    }

    async fn add(&self, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;
        let task = self.gateway.insert(&draft).await?;
        tracing::debug!(task_id = task.id, "Task inserted");
        Ok(task)
    }

    async fn update(&self, task: Task) -> Result<Task> {
        task.validate()?;
        match self.gateway.replace(&task).await? {
            WriteOutcome::Applied(updated) => Ok(updated),
            WriteOutcome::Conflict => Err(conflict(task.id)),
            WriteOutcome::Absent => Err(Error::NotFound(task.id)),
        }
    }

    async fn remove(&self, task: &Task) -> Result<()> {
        match self.gateway.delete(task.id, task.version).await? {
            WriteOutcome::Applied(()) => Ok(()),
            WriteOutcome::Conflict => Err(conflict(task.id)),
            WriteOutcome::Absent => Err(Error::NotFound(task.id)),
        }
    }
}
