use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::database::client::Database;
use crate::interfaces::distributed_lock::DistributedLockInterface;
use crate::middleware::error::AppResult;
use crate::services::distributed_exclusion::DistributedExclusion;
use crate::services::exclusion::{LockStrategy, ResourceExclusion};
use crate::services::row_lock_exclusion::RowLockExclusion;
use crate::utils::lock::memory_lock::InMemoryLockService;
use crate::utils::lock::redis_lock::RedisLockService;

pub struct CtxState {
    pub db: Database,
    pub is_development: bool,
    pub exclusion: Arc<dyn ResourceExclusion>,
}

impl Debug for CtxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtxState")
            .field("is_development", &self.is_development)
            .field("strategy", &self.exclusion.strategy())
            .finish()
    }
}

pub async fn create_ctx_state(db: Database, config: &AppConfig) -> AppResult<Arc<CtxState>> {
    let exclusion = create_exclusion(&db, config).await?;
    info!(strategy = %exclusion.strategy(), "->> like lock strategy");
    Ok(Arc::new(CtxState {
        db,
        is_development: config.is_development,
        exclusion,
    }))
}

async fn create_exclusion(
    db: &Database,
    config: &AppConfig,
) -> AppResult<Arc<dyn ResourceExclusion>> {
    let lock = &config.lock;
    let exclusion: Arc<dyn ResourceExclusion> = match lock.strategy {
        LockStrategy::Pessimistic => Arc::new(RowLockExclusion::new(
            db.fairytales.clone(),
            lock.wait_timeout,
        )),
        LockStrategy::Distributed => {
            let locks: Arc<dyn DistributedLockInterface> = match &lock.redis_url {
                Some(url) => Arc::new(RedisLockService::connect(url, lock.retry).await?),
                None => Arc::new(InMemoryLockService::new(lock.retry)),
            };
            Arc::new(DistributedExclusion::new(
                locks,
                lock.lease,
                lock.wait_timeout,
            ))
        }
    };
    Ok(exclusion)
}
