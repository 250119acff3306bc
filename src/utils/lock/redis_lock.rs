use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::RetryPolicy;
use crate::interfaces::distributed_lock::{DistributedLockInterface, LockToken};
use crate::middleware::error::{AppError, AppResult};

// Deletes the key only while it still holds our owner id.
static RELEASE_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#,
    )
});

/// Lease lock shared by every server instance connected to the same Redis.
#[derive(Clone)]
pub struct RedisLockService {
    conn: ConnectionManager,
    retry: RetryPolicy,
}

impl RedisLockService {
    pub async fn connect(url: &str, retry: RetryPolicy) -> AppResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("->> connected lock service");
        Ok(Self { conn, retry })
    }

    async fn try_acquire(&self, key: &str, owner: &str, lease: Duration) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(owner)
            .arg("NX")
            .arg("PX")
            .arg(lease.as_millis().max(1) as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl DistributedLockInterface for RedisLockService {
    async fn acquire(&self, key: &str, lease: Duration, wait: Duration) -> AppResult<LockToken> {
        let owner = Uuid::new_v4().to_string();
        let deadline = Instant::now() + wait;
        let mut delays = self.retry.delays();

        loop {
            if self.try_acquire(key, &owner, lease).await? {
                return Ok(LockToken {
                    key: key.to_string(),
                    owner,
                    lease,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(key, wait_ms = wait.as_millis() as u64, "lease wait timed out");
                return Err(AppError::LockTimeout {
                    key: key.to_string(),
                });
            }
            let delay = delays.next().unwrap_or(self.retry.max).min(deadline - now);
            tokio::time::sleep(delay).await;
        }
    }

    async fn release(&self, token: LockToken) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = RELEASE_SCRIPT
            .key(&token.key)
            .arg(&token.owner)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}
