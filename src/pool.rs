//! Fixed-size pool of SQLite connections shared by the request handlers.
//!
//! rusqlite connections are blocking, so every checkout runs its closure on
//! tokio's blocking thread pool and hands the connection back afterwards.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::db::Database;

type Idle = Arc<Mutex<Vec<Database>>>;

pub struct Pool {
    path: Arc<PathBuf>,
    idle: Idle,
    permits: Arc<Semaphore>,
    size: usize,
}

impl Pool {
    pub fn open(path: &Path, size: usize) -> Result<Arc<Self>> {
        let size = size.max(1);
        let mut conns = Vec::with_capacity(size);
        for _ in 0..size {
            conns.push(Database::open(path)?);
        }
        tracing::debug!(path = %path.display(), size, "opened connection pool");

        Ok(Arc::new(Pool {
            path: Arc::new(path.to_path_buf()),
            idle: Arc::new(Mutex::new(conns)),
            permits: Arc::new(Semaphore::new(size)),
            size,
        }))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `f` against a pooled connection, waiting for one to free up if
    /// all are checked out.
    ///
    /// The connection goes back to the pool from the blocking task itself, so
    /// dropping the returned future does not lose it.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("Connection pool is closed"))?;

        let db = lock(&self.idle)
            .pop()
            .context("No idle connection despite a free permit")?;

        let checkout = Checkout {
            db: Some(db),
            idle: Arc::clone(&self.idle),
            path: Arc::clone(&self.path),
            permits: Arc::clone(&self.permits),
            _permit: permit,
        };

        tokio::task::spawn_blocking(move || {
            let checkout = checkout;
            let result = match checkout.db.as_ref() {
                Some(db) => f(db),
                None => Err(anyhow!("Checked out connection is missing")),
            };
            result
        })
        .await
        .map_err(|err| {
            tracing::error!("Database task failed: {}", err);
            anyhow!("Database task failed: {}", err)
        })?
    }

    /// Stops handing out connections and drops the idle ones.
    pub fn close(&self) {
        self.permits.close();
        let dropped = {
            let mut idle = lock(&self.idle);
            let n = idle.len();
            idle.clear();
            n
        };
        tracing::info!(closed = dropped, "Connection pool closed");
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        lock(&self.idle).len()
    }
}

fn lock(idle: &Idle) -> MutexGuard<'_, Vec<Database>> {
    idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A connection on loan to one blocking task. Dropping it hands the
/// connection back before the permit is released.
struct Checkout {
    db: Option<Database>,
    idle: Idle,
    path: Arc<PathBuf>,
    permits: Arc<Semaphore>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if self.permits.is_closed() {
            return;
        }

        let db = if std::thread::panicking() {
            // The connection may be mid-statement; open a fresh one instead.
            self.db.take();
            match Database::open(&self.path) {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("Failed to replace pooled connection: {}", err);
                    return;
                }
            }
        } else {
            match self.db.take() {
                Some(db) => db,
                None => return,
            }
        };

        lock(&self.idle).push(db);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn setup_test_pool(size: usize) -> (Arc<Pool>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pool = Pool::open(&dir.path().join("test.db"), size).unwrap();
        (pool, dir)
    }

    #[tokio::test]
    async fn test_run_returns_closure_result() {
        let (pool, _dir) = setup_test_pool(2);
        let issue = pool
            .run(|db| db.create_issue(Some("Pothole"), Some("Deep"), None))
            .await
            .unwrap();
        let stats = pool.run(|db| db.stats()).await.unwrap();

        assert_eq!(issue.category, "Pothole");
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_size_is_at_least_one() {
        let (pool, _dir) = setup_test_pool(0);
        assert_eq!(pool.size(), 1);
        pool.run(|db| db.ping()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_share_pool() {
        let (pool, _dir) = setup_test_pool(3);
        let mut handles = Vec::new();
        for n in 0..20 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move {
                let category = format!("Cat{}", n % 4);
                pool.run(move |db| db.create_issue(Some(&category), Some("desc"), None))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stats = pool.run(|db| db.stats()).await.unwrap();
        assert_eq!(stats.total, 20);
        assert_eq!(pool.idle_count(), 3);
    }

    #[tokio::test]
    async fn test_error_returns_connection() {
        let (pool, _dir) = setup_test_pool(1);
        assert!(pool.run(|db| db.create_issue(None, None, None)).await.is_err());
        pool.run(|db| db.ping()).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_connection() {
        let (pool, _dir) = setup_test_pool(1);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            pool.run(|db| {
                std::thread::sleep(Duration::from_millis(100));
                db.ping()
            }),
        )
        .await;
        assert!(cancelled.is_err());

        // Waits for the orphaned task to hand its connection back.
        let stats = pool.run(|db| db.stats()).await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(pool.idle_count(), pool.size());
    }

    #[tokio::test]
    async fn test_many_cancelled_runs_keep_pool_size() {
        let (pool, _dir) = setup_test_pool(2);
        for _ in 0..5 {
            let _ = tokio::time::timeout(
                Duration::from_millis(1),
                pool.run(|db| {
                    std::thread::sleep(Duration::from_millis(20));
                    db.ping()
                }),
            )
            .await;
        }

        for _ in 0..4 {
            pool.run(|db| db.ping()).await.unwrap();
        }
        assert_eq!(pool.idle_count(), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_is_replaced() {
        let (pool, _dir) = setup_test_pool(1);
        let result = pool
            .run(|_db: &Database| -> Result<()> { panic!("statement blew up") })
            .await;
        assert!(result.is_err());

        pool.run(|db| db.ping()).await.unwrap();
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_error_keeps_pool_size() {
        let (pool, _dir) = setup_test_pool(2);
        for _ in 0..3 {
            assert!(pool.run(|db| db.create_issue(None, None, None)).await.is_err());
        }
        assert_eq!(pool.idle_count(), 2);
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_work() {
        let (pool, _dir) = setup_test_pool(1);
        pool.close();
        let err = pool.run(|db| db.ping()).await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
