use surrealdb::sql::Thing;
use tracing::{debug, warn};

use crate::{
    database::table_names::{FAIRYTALE_TABLE_NAME, USER_TABLE_NAME},
    entities::{like::Like, user::User},
    interfaces::repositories::{
        fairytale::FairytalesRepositoryInterface, like::LikesRepositoryInterface,
        user::UsersRepositoryInterface,
    },
    middleware::error::{AppError, AppResult},
    services::exclusion::{ExclusionToken, LockedFairytale, ResourceExclusion},
};

pub struct LikeService<'a, L, F, U>
where
    L: LikesRepositoryInterface,
    F: FairytalesRepositoryInterface,
    U: UsersRepositoryInterface,
{
    likes_repository: &'a L,
    fairytales_repository: &'a F,
    users_repository: &'a U,
    exclusion: &'a dyn ResourceExclusion,
}

impl<'a, L, F, U> LikeService<'a, L, F, U>
where
    L: LikesRepositoryInterface,
    F: FairytalesRepositoryInterface,
    U: UsersRepositoryInterface,
{
    pub fn new(
        likes_repository: &'a L,
        fairytales_repository: &'a F,
        users_repository: &'a U,
        exclusion: &'a dyn ResourceExclusion,
    ) -> Self {
        Self {
            likes_repository,
            fairytales_repository,
            users_repository,
            exclusion,
        }
    }

    pub async fn add_like(&self, user_id: &str, fairytale_id: &str) -> AppResult<Like> {
        let user = self.get_user(user_id).await?;
        let fairytale = Thing::from((FAIRYTALE_TABLE_NAME, fairytale_id));

        let token = self.exclusion.acquire(&fairytale).await?;
        let result = self.add_like_locked(&user, &token).await;
        self.release(token).await;

        let like = result?;
        debug!(user_id, fairytale_id, strategy = %self.exclusion.strategy(), "like added");
        Ok(like)
    }

    pub async fn remove_like(&self, user_id: &str, fairytale_id: &str) -> AppResult<()> {
        let user = self.get_user(user_id).await?;
        let fairytale = Thing::from((FAIRYTALE_TABLE_NAME, fairytale_id));

        let token = self.exclusion.acquire(&fairytale).await?;
        let result = self.remove_like_locked(&user, &token).await;
        self.release(token).await;

        result?;
        debug!(user_id, fairytale_id, strategy = %self.exclusion.strategy(), "like removed");
        Ok(())
    }

    pub async fn is_liked(&self, user_id: &str, fairytale_id: &str) -> AppResult<bool> {
        let user = Thing::from((USER_TABLE_NAME, user_id));
        let fairytale = Thing::from((FAIRYTALE_TABLE_NAME, fairytale_id));
        let like = self.likes_repository.find(&user, &fairytale).await?;
        Ok(like.is_some())
    }

    /// Ids of the fairytales the user likes, newest like first.
    pub async fn get_likes(&self, user_id: &str) -> AppResult<Vec<String>> {
        let user = self.get_user(user_id).await?;
        let likes = self.likes_repository.list_by_user(&user.id).await?;
        Ok(likes
            .into_iter()
            .map(|like| like.fairytale.id.to_raw())
            .collect())
    }

    pub async fn like_count(&self, fairytale_id: &str) -> AppResult<u64> {
        let fairytale = self
            .fairytales_repository
            .get(fairytale_id)
            .await?
            .ok_or(AppError::FairytaleNotFound {
                fairytale_id: fairytale_id.to_string(),
            })?;
        Ok(fairytale.like_count())
    }

    async fn add_like_locked(&self, user: &User, token: &ExclusionToken) -> AppResult<Like> {
        let mut fairytale = self.get_locked(token).await?;

        if self
            .likes_repository
            .find(&user.id, fairytale.id())
            .await?
            .is_some()
        {
            return Err(AppError::LikeAlreadyExists {
                user_id: user.id.id.to_raw(),
                fairytale_id: fairytale.id().id.to_raw(),
            });
        }

        fairytale.increase_like_count();
        self.likes_repository.create(&user.id, &fairytale).await
    }

    async fn remove_like_locked(&self, user: &User, token: &ExclusionToken) -> AppResult<()> {
        let mut fairytale = self.get_locked(token).await?;

        let like = self
            .likes_repository
            .find(&user.id, fairytale.id())
            .await?
            .ok_or(AppError::LikeNotFound {
                user_id: user.id.id.to_raw(),
                fairytale_id: fairytale.id().id.to_raw(),
            })?;

        fairytale.decrease_like_count();
        self.likes_repository.delete(&like, &fairytale).await
    }

    async fn get_locked<'t>(
        &self,
        token: &'t ExclusionToken,
    ) -> AppResult<LockedFairytale<'t>> {
        self.fairytales_repository
            .get_locked(token)
            .await?
            .ok_or(AppError::FairytaleNotFound {
                fairytale_id: token.fairytale().id.to_raw(),
            })
    }

    async fn get_user(&self, user_id: &str) -> AppResult<User> {
        self.users_repository
            .get(user_id)
            .await?
            .ok_or(AppError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    // release errors never change the outcome of the operation
    async fn release(&self, token: ExclusionToken) {
        let fairytale = token.fairytale().to_string();
        if let Err(err) = token.release().await {
            warn!(fairytale = %fairytale, error = %err, "failed to release like lock");
        }
    }
}
