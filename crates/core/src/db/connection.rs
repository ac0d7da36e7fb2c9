//! Database connection management with pragma configuration.
//!
//! Opens the SQLite database, applies the pragmas the task store relies on
//! and runs pending migrations.

use std::path::Path;
use std::time::Duration;

use tokio_rusqlite::Connection;

use super::migrations;
use crate::{Error, Result};

/// How long a writer waits on a locked database before giving up with a conflict
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Task database handle.
///
/// Wraps a tokio-rusqlite Connection that runs every statement on a
/// background thread. Cloning shares the same connection.
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    /// Open an in-memory database, used by tests and `:memory:` configs.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        tracing::debug!("Task database ready");
        Ok(Self { conn })
    }

    /// Round-trip a trivial query to prove the connection is alive.
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}
