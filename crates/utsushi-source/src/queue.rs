//! Per-path write serialization.
//!
//! An AI-authored edit and a direct-manipulation edit can target the same
//! file at once. Every read-modify-write of a file happens while holding
//! that path's lock, so two writers never interleave.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

use crate::error::{SourceError, SourceResult};

/// Default wait before a writer gives up on a path lock.
pub const DEFAULT_WRITE_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Write queue keyed by file path.
#[derive(Debug)]
pub struct WriteQueue {
    /// path -> lock held for the duration of one read-modify-write
    locks: DashMap<String, Arc<TokioMutex<()>>>,
    timeout: Duration,
}

/// Held while a path is being rewritten. Dropping it releases the path.
#[derive(Debug)]
pub struct PathGuard {
    path: String,
    _guard: OwnedMutexGuard<()>,
}

impl PathGuard {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_LOCK_TIMEOUT)
    }
}

impl WriteQueue {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for the path's lock. `WriteConflict` when it is not free in time.
    pub async fn lock(&self, path: &str) -> SourceResult<PathGuard> {
        // Clone the Arc out so the shard lock is not held across the await.
        let lock = self
            .locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone();

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(PathGuard {
                path: path.to_string(),
                _guard: guard,
            }),
            Err(_) => {
                tracing::warn!(path = %path, timeout = ?self.timeout, "write lock timed out");
                Err(SourceError::WriteConflict(path.to_string()))
            }
        }
    }

    /// Lock several paths in sorted order. Sorting keeps two multi-file
    /// writers from deadlocking on each other.
    pub async fn lock_all(&self, paths: &[String]) -> SourceResult<Vec<PathGuard>> {
        let mut sorted: Vec<&String> = paths.iter().collect();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for path in sorted {
            guards.push(self.lock(path).await?);
        }
        Ok(guards)
    }

    /// Whether some writer currently holds the path.
    pub fn is_locked(&self, path: &str) -> bool {
        self.locks
            .get(path)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_releases_on_drop() {
        let queue = WriteQueue::new(Duration::from_millis(50));
        {
            let guard = queue.lock("a.tsx").await.unwrap();
            assert_eq!(guard.path(), "a.tsx");
            assert!(queue.is_locked("a.tsx"));
        }
        assert!(!queue.is_locked("a.tsx"));
        queue.lock("a.tsx").await.unwrap();
    }

    #[tokio::test]
    async fn test_second_writer_times_out() {
        let queue = WriteQueue::new(Duration::from_millis(20));
        let _held = queue.lock("a.tsx").await.unwrap();
        let err = queue.lock("a.tsx").await.unwrap_err();
        assert!(matches!(err, SourceError::WriteConflict(p) if p == "a.tsx"));
        // other paths are unaffected
        queue.lock("b.tsx").await.unwrap();
    }

    #[tokio::test]
    async fn test_waiting_writer_proceeds_after_release() {
        let queue = Arc::new(WriteQueue::new(Duration::from_secs(2)));
        let held = queue.lock("a.tsx").await.unwrap();

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.lock("a.tsx").await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_lock_all_dedups() {
        let queue = WriteQueue::default();
        let guards = queue
            .lock_all(&["b.tsx".to_string(), "a.tsx".to_string(), "b.tsx".to_string()])
            .await
            .unwrap();
        let paths: Vec<&str> = guards.iter().map(|g| g.path()).collect();
        assert_eq!(paths, vec!["a.tsx", "b.tsx"]);
    }
}
