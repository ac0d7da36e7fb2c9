//! Database schema migrations.
//!
//! A version table records which migrations have been applied. Each
//! migration is a SQL batch applied at most once, in order.

use tokio_rusqlite::{params, Connection};

use crate::{Error, Result};

/// Migration list: (version, SQL).
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_tasks.sql"))];

/// Run any pending migrations.
pub(crate) async fn run(conn: &Connection) -> Result<()> {
    conn.call(|conn| -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, sql) in MIGRATIONS {
            if *version <= current {
                continue;
            }
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::Migration(format!("version {}: {}", version, e)))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::info!("Applied migration {}", version);
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let (applied, has_tasks): (i64, bool) = conn
            .call(|conn| {
                let applied = conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| {
                    row.get(0)
                })?;
                let has_tasks = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks')",
                    [],
                    |row| row.get(0),
                )?;
                Ok::<_, tokio_rusqlite::rusqlite::Error>((applied, has_tasks))
            })
            .await
            .unwrap();

        assert_eq!(applied, MIGRATIONS.len() as i64);
        assert!(has_tasks);
    }
}
