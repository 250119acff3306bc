use std::time::Duration;

use crate::database::row_lock::RowLockGuard;
use crate::entities::fairytale::{CreateFairytale, Fairytale};
use crate::middleware::error::AppResult;
use crate::services::exclusion::{ExclusionToken, LockedFairytale};
use async_trait::async_trait;
use surrealdb::sql::Thing;

#[async_trait]
pub trait FairytalesRepositoryInterface: Send + Sync {
    async fn create(&self, data: CreateFairytale) -> AppResult<Fairytale>;
    async fn get(&self, fairytale_id: &str) -> AppResult<Option<Fairytale>>;
    /// Exclusive lock on the fairytale record, held until the guard drops.
    async fn lock_for_update(&self, fairytale: &Thing, wait: Duration) -> AppResult<RowLockGuard>;
    /// Loads the fairytale the token protects.
    async fn get_locked<'t>(
        &self,
        token: &'t ExclusionToken,
    ) -> AppResult<Option<LockedFairytale<'t>>>;
}
