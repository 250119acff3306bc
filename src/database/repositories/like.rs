use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::database::table_names::{FAIRYTALE_TABLE_NAME, LIKE_TABLE_NAME, USER_TABLE_NAME};
use crate::entities::like::Like;
use crate::interfaces::repositories::like::LikesRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};
use crate::services::exclusion::LockedFairytale;

// relative to the stored counter, floored at 0
const LIKE_COUNT_UPDATE: &str = "math::max([math::max([like_count ?? 0, 0]) + $delta, 0])";

#[derive(Debug)]
pub struct LikesRepository {
    client: Arc<Db>,
}

impl LikesRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("

    DEFINE TABLE IF NOT EXISTS {LIKE_TABLE_NAME} TYPE RELATION IN {USER_TABLE_NAME} OUT {FAIRYTALE_TABLE_NAME} ENFORCED SCHEMAFULL PERMISSIONS NONE;
    DEFINE INDEX IF NOT EXISTS in_out_unique_idx ON {LIKE_TABLE_NAME} FIELDS in, out UNIQUE;
    DEFINE INDEX IF NOT EXISTS in_idx ON {LIKE_TABLE_NAME} FIELDS in;
    DEFINE INDEX IF NOT EXISTS out_idx ON {LIKE_TABLE_NAME} FIELDS out;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {LIKE_TABLE_NAME} TYPE datetime DEFAULT time::now();

    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl LikesRepositoryInterface for LikesRepository {
    async fn find(&self, user: &Thing, fairytale: &Thing) -> AppResult<Option<Like>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {LIKE_TABLE_NAME} WHERE in=$in AND out=$out LIMIT 1;"
            ))
            .bind(("in", user.clone()))
            .bind(("out", fairytale.clone()))
            .await?;
        Ok(res.take::<Option<Like>>(0)?)
    }

    async fn list_by_user(&self, user: &Thing) -> AppResult<Vec<Like>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {LIKE_TABLE_NAME} WHERE in=$in ORDER BY created_at DESC;"
            ))
            .bind(("in", user.clone()))
            .await?;
        Ok(res.take::<Vec<Like>>(0)?)
    }

    async fn count_by_fairytale(&self, fairytale: &Thing) -> AppResult<u64> {
        let mut res = self
            .client
            .query(format!(
                "RETURN array::len((SELECT VALUE id FROM {LIKE_TABLE_NAME} WHERE out=$out));"
            ))
            .bind(("out", fairytale.clone()))
            .await?;
        let count = res.take::<Option<i64>>(0)?.unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    async fn create(&self, user: &Thing, fairytale: &LockedFairytale<'_>) -> AppResult<Like> {
        let res = self
            .client
            .query(format!(
                "BEGIN TRANSACTION; \
                LET $like = (RELATE $in->{LIKE_TABLE_NAME}->$out)[0]; \
                UPDATE $out SET like_count={LIKE_COUNT_UPDATE}; \
                COMMIT TRANSACTION; \
                RETURN $like;"
            ))
            .bind(("in", user.clone()))
            .bind(("out", fairytale.id().clone()))
            .bind(("delta", fairytale.like_count_delta()))
            .await?;

        let mut res = res.check()?;
        let like = res.take::<Option<Like>>(res.num_statements() - 1)?;
        like.ok_or(AppError::StorageFailure {
            source: "like relation was not returned".to_string(),
        })
    }

    async fn delete(&self, like: &Like, fairytale: &LockedFairytale<'_>) -> AppResult<()> {
        let res = self
            .client
            .query(format!(
                "BEGIN TRANSACTION; \
                DELETE $like; \
                UPDATE $out SET like_count={LIKE_COUNT_UPDATE}; \
                COMMIT TRANSACTION;"
            ))
            .bind(("like", like.id.clone()))
            .bind(("out", fairytale.id().clone()))
            .bind(("delta", fairytale.like_count_delta()))
            .await?;
        res.check()?;
        Ok(())
    }
}
