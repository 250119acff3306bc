use crate::entities::like::Like;
use crate::middleware::error::AppResult;
use crate::services::exclusion::LockedFairytale;
use async_trait::async_trait;
use surrealdb::sql::Thing;

#[async_trait]
pub trait LikesRepositoryInterface: Send + Sync {
    async fn find(&self, user: &Thing, fairytale: &Thing) -> AppResult<Option<Like>>;
    async fn list_by_user(&self, user: &Thing) -> AppResult<Vec<Like>>;
    async fn count_by_fairytale(&self, fairytale: &Thing) -> AppResult<u64>;
    /// Stores the like and applies the handle's counter change in one transaction.
    async fn create(&self, user: &Thing, fairytale: &LockedFairytale<'_>) -> AppResult<Like>;
    /// Deletes the like and applies the handle's counter change in one transaction.
    async fn delete(&self, like: &Like, fairytale: &LockedFairytale<'_>) -> AppResult<()>;
}
