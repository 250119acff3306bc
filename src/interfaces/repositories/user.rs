use crate::entities::user::User;
use crate::middleware::error::AppResult;
use async_trait::async_trait;

#[async_trait]
pub trait UsersRepositoryInterface: Send + Sync {
    async fn create(&self, username: &str) -> AppResult<User>;
    async fn get(&self, user_id: &str) -> AppResult<Option<User>>;
}
