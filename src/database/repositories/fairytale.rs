use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::database::row_lock::{RowLockGuard, RowLocks};
use crate::database::table_names::{FAIRYTALE_TABLE_NAME, USER_TABLE_NAME};
use crate::entities::fairytale::{CreateFairytale, Fairytale};
use crate::interfaces::repositories::fairytale::FairytalesRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};
use crate::services::exclusion::{ExclusionToken, LockedFairytale};

#[derive(Debug)]
pub struct FairytalesRepository {
    client: Arc<Db>,
    row_locks: RowLocks,
}

impl FairytalesRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self {
            client,
            row_locks: RowLocks::new(),
        }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!(
            "
    DEFINE TABLE IF NOT EXISTS {FAIRYTALE_TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS title ON TABLE {FAIRYTALE_TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS content ON TABLE {FAIRYTALE_TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS created_by ON TABLE {FAIRYTALE_TABLE_NAME} TYPE option<record<{USER_TABLE_NAME}>>;
    DEFINE FIELD IF NOT EXISTS is_public ON TABLE {FAIRYTALE_TABLE_NAME} TYPE bool DEFAULT true;
    DEFINE FIELD IF NOT EXISTS like_count ON TABLE {FAIRYTALE_TABLE_NAME} TYPE option<int> DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {FAIRYTALE_TABLE_NAME} TYPE datetime DEFAULT time::now();
    "
        );
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl FairytalesRepositoryInterface for FairytalesRepository {
    async fn create(&self, data: CreateFairytale) -> AppResult<Fairytale> {
        let mut res = self
            .client
            .query(format!("CREATE ONLY {FAIRYTALE_TABLE_NAME} CONTENT $data;"))
            .bind(("data", data))
            .await?;
        let fairytale = res.take::<Option<Fairytale>>(0)?;
        fairytale.ok_or(AppError::Generic {
            description: "fairytale was not created".to_string(),
        })
    }

    async fn get(&self, fairytale_id: &str) -> AppResult<Option<Fairytale>> {
        let data: Option<Fairytale> = self
            .client
            .select((FAIRYTALE_TABLE_NAME, fairytale_id))
            .await?;
        Ok(data)
    }

    async fn lock_for_update(&self, fairytale: &Thing, wait: Duration) -> AppResult<RowLockGuard> {
        self.row_locks.lock(fairytale.to_string(), wait).await
    }

    async fn get_locked<'t>(
        &self,
        token: &'t ExclusionToken,
    ) -> AppResult<Option<LockedFairytale<'t>>> {
        let id = token.fairytale();
        let data: Option<Fairytale> = self
            .client
            .select((id.tb.as_str(), id.id.to_raw()))
            .await?;
        match data {
            Some(fairytale) => Ok(Some(LockedFairytale::new(token, fairytale)?)),
            None => Ok(None),
        }
    }
}
