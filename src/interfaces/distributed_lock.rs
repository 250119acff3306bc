use std::time::Duration;

use crate::middleware::error::AppResult;
use async_trait::async_trait;

/// Proof of a held named lock. `owner` is unique per acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    pub key: String,
    pub owner: String,
    pub lease: Duration,
}

#[async_trait]
pub trait DistributedLockInterface: Send + Sync {
    /// Waits up to `wait` for `key`; the lock expires on its own after `lease`.
    async fn acquire(&self, key: &str, lease: Duration, wait: Duration) -> AppResult<LockToken>;
    /// Returns false when the lease had already expired or been taken over.
    async fn release(&self, token: LockToken) -> AppResult<bool>;
}
