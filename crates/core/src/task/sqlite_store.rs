//! SQLite-backed task storage implementation
//!
//! Every write is keyed on the row's version so two writers starting from
//! the same snapshot cannot both succeed.

use async_trait::async_trait;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row};
use tokio_rusqlite::params;

use super::gateway::{TaskGateway, WriteOutcome};
use super::model::{Task, TaskDraft, TaskId};
use crate::db::Database;
use crate::{Error, Result};

const TASK_SELECT_SQL: &str = "SELECT id, title, description, is_completed, version FROM tasks";

/// Task gateway over the `tasks` table
#[derive(Clone, Debug)]
pub struct SqliteTaskStore {
    db: Database,
}

impl SqliteTaskStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_completed: row.get(3)?,
        version: row.get(4)?,
    })
}

fn row_exists(conn: &rusqlite::Connection, id: TaskId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

#[async_trait]
impl TaskGateway for SqliteTaskStore {
    async fn fetch_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        self.db
            .conn
            .call(move |conn| -> Result<Option<Task>> {
                let task = conn
                    .query_row(
                        &format!("{} WHERE id = ?1", TASK_SELECT_SQL),
                        params![id],
                        task_from_row,
                    )
                    .optional()?;
                Ok(task)
            })
            .await
            .map_err(Error::from)
    }

    async fn fetch_all(&self) -> Result<Vec<Task>> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<Task>> {
                let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", TASK_SELECT_SQL))?;
                let tasks = stmt
                    .query_map([], task_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(tasks)
            })
            .await
            .map_err(Error::from)
    }

    async fn insert(&self, draft: &TaskDraft) -> Result<Task> {
        let draft = draft.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Task> {
                conn.execute(
                    "INSERT INTO tasks (title, description, is_completed, version)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        &draft.title,
                        &draft.description,
                        draft.is_completed,
                        super::model::INITIAL_VERSION
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(draft.into_task(id))
            })
            .await
            .map_err(Error::from)
    }

    async fn replace(&self, task: &Task) -> Result<WriteOutcome<Task>> {
        let task = task.clone();
        self.db
            .conn
            .call(move |conn| -> Result<WriteOutcome<Task>> {
                let tx = conn.transaction()?;
                let changed = tx.execute(
                    "UPDATE tasks
                     SET title = ?1, description = ?2, is_completed = ?3, version = version + 1
                     WHERE id = ?4 AND version = ?5",
                    params![
                        &task.title,
                        &task.description,
                        task.is_completed,
                        task.id,
                        task.version
                    ],
                )?;

                let outcome = if changed > 0 {
                    WriteOutcome::Applied(Task {
                        version: task.version + 1,
                        ..task
                    })
                } else if row_exists(&tx, task.id)? {
                    WriteOutcome::Conflict
                } else {
                    WriteOutcome::Absent
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, id: TaskId, version: i64) -> Result<WriteOutcome<()>> {
        self.db
            .conn
            .call(move |conn| -> Result<WriteOutcome<()>> {
                let tx = conn.transaction()?;
                let removed = tx.execute(
                    "DELETE FROM tasks WHERE id = ?1 AND version = ?2",
                    params![id, version],
                )?;

                let outcome = if removed > 0 {
                    WriteOutcome::Applied(())
                } else if row_exists(&tx, id)? {
                    WriteOutcome::Conflict
                } else {
                    WriteOutcome::Absent
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> SqliteTaskStore {
        SqliteTaskStore::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = create_test_store().await;

        let first = store.insert(&TaskDraft::new("Task 1")).await.unwrap();
        let second = store.insert(&TaskDraft::new("Task 2")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.version, 1);
    }

    #[tokio::test]
    async fn test_fetch_by_id() {
        let store = create_test_store().await;

        let created = store
            .insert(&TaskDraft::new("Buy milk").with_description("2%"))
            .await
            .unwrap();

        let fetched = store.fetch_by_id(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));

        let missing = store.fetch_by_id(404).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_fetch_all_in_id_order() {
        let store = create_test_store().await;

        store.insert(&TaskDraft::new("Task 1")).await.unwrap();
        store.insert(&TaskDraft::new("Task 2")).await.unwrap();
        store.insert(&TaskDraft::new("Task 3")).await.unwrap();

        let tasks = store.fetch_all().await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Task 1", "Task 2", "Task 3"]);
    }

    #[tokio::test]
    async fn test_replace_bumps_version() {
        let store = create_test_store().await;

        let mut task = store.insert(&TaskDraft::new("Original")).await.unwrap();
        task.title = "Updated".to_string();
        task.is_completed = true;

        let outcome = store.replace(&task).await.unwrap();
        let WriteOutcome::Applied(updated) = outcome else {
            panic!("Expected Applied, got: {:?}", outcome);
        };
        assert_eq!(updated.version, 2);

        let stored = store.fetch_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Updated");
        assert!(stored.is_completed);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_replace_with_stale_version_conflicts() {
        let store = create_test_store().await;

        let task = store.insert(&TaskDraft::new("Original")).await.unwrap();
        let mut first = task.clone();
        first.title = "First writer".to_string();
        let mut second = task;
        second.title = "Second writer".to_string();

        assert!(matches!(
            store.replace(&first).await.unwrap(),
            WriteOutcome::Applied(_)
        ));
        assert_eq!(
            store.replace(&second).await.unwrap(),
            WriteOutcome::Conflict
        );

        let stored = store.fetch_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "First writer");
    }

    #[tokio::test]
    async fn test_replace_missing_row_is_absent() {
        let store = create_test_store().await;

        let task = TaskDraft::new("Ghost").into_task(12);
        assert_eq!(store.replace(&task).await.unwrap(), WriteOutcome::Absent);
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let store = create_test_store().await;

        let task = store.insert(&TaskDraft::new("Task to delete")).await.unwrap();

        assert_eq!(
            store.delete(task.id, task.version + 1).await.unwrap(),
            WriteOutcome::Conflict
        );
        assert_eq!(
            store.delete(task.id, task.version).await.unwrap(),
            WriteOutcome::Applied(())
        );
        assert_eq!(
            store.delete(task.id, task.version).await.unwrap(),
            WriteOutcome::Absent
        );
        assert!(store.fetch_by_id(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_title_rejected_by_schema() {
        let store = create_test_store().await;

        let result = store.insert(&TaskDraft::new("  ")).await;
        match result {
            Err(e) => assert!(e.is_store_failure(), "unexpected error: {:?}", e),
            Ok(task) => panic!("Expected constraint failure, got: {:?}", task),
        }
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.sqlite");

        let task_id;

        {
            let store = SqliteTaskStore::new(Database::open(&path).await.unwrap());
            let task = store
                .insert(&TaskDraft::new("Persistent task").with_description("Should survive reload"))
                .await
                .unwrap();
            task_id = task.id;
        }

        {
            let store = SqliteTaskStore::new(Database::open(&path).await.unwrap());
            let task = store.fetch_by_id(task_id).await.unwrap().unwrap();
            assert_eq!(task.title, "Persistent task");
            assert_eq!(task.description, "Should survive reload");
        }
    }
}
