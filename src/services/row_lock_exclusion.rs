use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use surrealdb::sql::Thing;
use tracing::debug;

use crate::interfaces::repositories::fairytale::FairytalesRepositoryInterface;
use crate::middleware::error::AppResult;
use crate::services::exclusion::{ExclusionToken, LockStrategy, ResourceExclusion};

/// Exclusion through the fairytale record lock of the storage node.
///
/// Only writers sharing the same repository are excluded from each other.
pub struct RowLockExclusion<F>
where
    F: FairytalesRepositoryInterface,
{
    fairytales: Arc<F>,
    wait: Duration,
}

impl<F> RowLockExclusion<F>
where
    F: FairytalesRepositoryInterface,
{
    pub fn new(fairytales: Arc<F>, wait: Duration) -> Self {
        Self { fairytales, wait }
    }
}

#[async_trait]
impl<F> ResourceExclusion for RowLockExclusion<F>
where
    F: FairytalesRepositoryInterface + 'static,
{
    fn strategy(&self) -> LockStrategy {
        LockStrategy::Pessimistic
    }

    async fn acquire(&self, fairytale: &Thing) -> AppResult<ExclusionToken> {
        let guard = self.fairytales.lock_for_update(fairytale, self.wait).await?;
        debug!(key = guard.key(), "row lock acquired");
        Ok(ExclusionToken::row(fairytale.clone(), guard))
    }
}
