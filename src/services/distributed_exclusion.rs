use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use surrealdb::sql::Thing;
use tracing::debug;

use crate::interfaces::distributed_lock::DistributedLockInterface;
use crate::middleware::error::AppResult;
use crate::services::exclusion::{ExclusionToken, LockStrategy, ResourceExclusion};

pub const LIKE_LOCK_KEY_PREFIX: &str = "fairytale:like";

pub fn like_lock_key(fairytale: &Thing) -> String {
    format!("{LIKE_LOCK_KEY_PREFIX}:{}", fairytale.id.to_raw())
}

/// Exclusion through a named lease lock shared by every server instance.
pub struct DistributedExclusion {
    locks: Arc<dyn DistributedLockInterface>,
    lease: Duration,
    wait: Duration,
}

impl DistributedExclusion {
    pub fn new(locks: Arc<dyn DistributedLockInterface>, lease: Duration, wait: Duration) -> Self {
        Self { locks, lease, wait }
    }
}

#[async_trait]
impl ResourceExclusion for DistributedExclusion {
    fn strategy(&self) -> LockStrategy {
        LockStrategy::Distributed
    }

    async fn acquire(&self, fairytale: &Thing) -> AppResult<ExclusionToken> {
        let key = like_lock_key(fairytale);
        let token = self.locks.acquire(&key, self.lease, self.wait).await?;
        debug!(key = %key, owner = %token.owner, "distributed lock acquired");
        Ok(ExclusionToken::distributed(
            fairytale.clone(),
            token,
            self.locks.clone(),
        ))
    }
}
