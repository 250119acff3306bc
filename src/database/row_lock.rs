use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::middleware::error::{AppError, AppResult};

type RowTable = DashMap<String, Arc<Mutex<()>>>;

/// Exclusive per-record locks for one storage node.
///
/// A record entry lives only while somebody holds or waits on it. Waiters on
/// the same record are served in FIFO order.
#[derive(Debug, Default)]
pub struct RowLocks {
    rows: Arc<RowTable>,
}

/// Held lock on one record, released on drop.
#[derive(Debug)]
pub struct RowLockGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    rows: Arc<RowTable>,
}

impl RowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: String, wait: Duration) -> AppResult<RowLockGuard> {
        let row = Arc::clone(&*self.rows.entry(key.clone()).or_default());

        match tokio::time::timeout(wait, Arc::clone(&row).lock_owned()).await {
            Ok(guard) => Ok(RowLockGuard {
                key,
                guard: Some(guard),
                rows: self.rows.clone(),
            }),
            Err(_) => {
                drop(row);
                remove_if_idle(&self.rows, &key);
                warn!(key = %key, wait_ms = wait.as_millis() as u64, "row lock wait timed out");
                Err(AppError::LockTimeout { key })
            }
        }
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.rows
            .get(key)
            .map(|row| row.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Number of records with a holder or a waiter.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for RowLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        remove_if_idle(&self.rows, &self.key);
    }
}

// Every holder and waiter keeps its own clone of the row Arc, so a count of
// one means only the table references it.
fn remove_if_idle(rows: &RowTable, key: &str) {
    rows.remove_if(key, |_, row| Arc::strong_count(row) == 1);
}
