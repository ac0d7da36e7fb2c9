//! Read-through cache for the full task list
//!
//! Holds a single entry ("all tasks") that expires on whichever comes first:
//! the absolute TTL since it was stored, or the idle TTL since it was last
//! read. Writes never invalidate it, so a list served from the cache can lag
//! behind add/update/remove for up to the TTL window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::task::{Task, TaskRepository};
use crate::Result;

/// Expiry settings for the list cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub absolute: Duration,
    pub idle: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            absolute: Duration::from_secs(5 * 60),
            idle: Duration::from_secs(2 * 60),
        }
    }
}

/// Where a listed result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// A full task list plus how it was obtained
#[derive(Debug, Clone)]
pub struct CachedTasks {
    pub tasks: Arc<Vec<Task>>,
    pub status: CacheStatus,
}

#[derive(Debug)]
struct CacheEntry {
    tasks: Arc<Vec<Task>>,
    inserted_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    // A clock that moved backwards counts as no time passed.
    (now - since).to_std().unwrap_or_default()
}

impl CacheTtl {
    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        elapsed(entry.inserted_at, now) < self.absolute
            && elapsed(entry.last_accessed_at, now) < self.idle
    }
}

/// Single-entry read-through cache over [`TaskRepository::get_all`]
pub struct TaskListCache {
    repository: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock + Send + Sync>,
    ttl: CacheTtl,
    entry: Mutex<Option<CacheEntry>>,
}

impl TaskListCache {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
        ttl: CacheTtl,
    ) -> Self {
        Self {
            repository,
            clock,
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    /// Return the cached list if it is still fresh, otherwise reload it
    ///
    /// The lock is released while the repository is queried, so concurrent
    /// misses each reload. A failed reload leaves the cache empty and the
    /// error goes to the caller unchanged.
    pub async fn get_all(&self, cancel: &CancellationToken) -> Result<CachedTasks> {
        {
            let now = self.clock.utc();
            let mut entry = self.entry.lock().await;
            if let Some(cached) = entry.as_mut() {
                if self.ttl.is_fresh(cached, now) {
                    cached.last_accessed_at = now;
                    return Ok(CachedTasks {
                        tasks: Arc::clone(&cached.tasks),
                        status: CacheStatus::Hit,
                    });
                }
            }
            *entry = None;
        }

        let tasks = Arc::new(self.repository.get_all(cancel).await?);

        let stored_at = self.clock.utc();
        *self.entry.lock().await = Some(CacheEntry {
            tasks: Arc::clone(&tasks),
            inserted_at: stored_at,
            last_accessed_at: stored_at,
        });

        Ok(CachedTasks {
            tasks,
            status: CacheStatus::Miss,
        })
    }
}
