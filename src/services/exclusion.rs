use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::database::row_lock::RowLockGuard;
use crate::entities::fairytale::Fairytale;
use crate::interfaces::distributed_lock::{DistributedLockInterface, LockToken};
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    Pessimistic,
    Distributed,
}

/// Mutual exclusion over the like state of one fairytale.
///
/// At most one token per fairytale is alive at a time. Tokens for different
/// fairytales never wait on each other.
#[async_trait]
pub trait ResourceExclusion: Send + Sync {
    fn strategy(&self) -> LockStrategy;

    async fn acquire(&self, fairytale: &Thing) -> AppResult<ExclusionToken>;
}

enum HeldLock {
    Row(RowLockGuard),
    Distributed {
        token: LockToken,
        locks: Arc<dyn DistributedLockInterface>,
    },
}

/// Held exclusion for one fairytale. Released by [`ExclusionToken::release`]
/// or, on any other exit path, when dropped.
pub struct ExclusionToken {
    fairytale: Thing,
    held: Option<HeldLock>,
    acquired_at: Instant,
}

impl ExclusionToken {
    pub(crate) fn row(fairytale: Thing, guard: RowLockGuard) -> Self {
        Self {
            fairytale,
            held: Some(HeldLock::Row(guard)),
            acquired_at: Instant::now(),
        }
    }

    pub(crate) fn distributed(
        fairytale: Thing,
        token: LockToken,
        locks: Arc<dyn DistributedLockInterface>,
    ) -> Self {
        Self {
            fairytale,
            held: Some(HeldLock::Distributed { token, locks }),
            acquired_at: Instant::now(),
        }
    }

    pub fn fairytale(&self) -> &Thing {
        &self.fairytale
    }

    pub async fn release(mut self) -> AppResult<()> {
        let held_ms = self.acquired_at.elapsed().as_millis() as u64;
        match self.held.take() {
            Some(HeldLock::Row(guard)) => {
                debug!(key = guard.key(), held_ms, "row lock released");
                drop(guard);
            }
            Some(HeldLock::Distributed { token, locks }) => {
                let key = token.key.clone();
                if self.acquired_at.elapsed() > token.lease {
                    let lease_ms = token.lease.as_millis() as u64;
                    warn!(key = %key, held_ms, lease_ms, "lock held past its lease");
                }
                if locks.release(token).await? {
                    debug!(key = %key, held_ms, "distributed lock released");
                } else {
                    warn!(key = %key, held_ms, "lease expired before release");
                }
            }
            None => {}
        }
        Ok(())
    }
}

impl fmt::Debug for ExclusionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.held {
            Some(HeldLock::Row(_)) => "row",
            Some(HeldLock::Distributed { .. }) => "distributed",
            None => "released",
        };
        f.debug_struct("ExclusionToken")
            .field("fairytale", &self.fairytale.to_string())
            .field("kind", &kind)
            .finish()
    }
}

impl Drop for ExclusionToken {
    fn drop(&mut self) {
        match self.held.take() {
            Some(HeldLock::Row(guard)) => drop(guard),
            Some(HeldLock::Distributed { token, locks }) => match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        let key = token.key.clone();
                        if let Err(err) = locks.release(token).await {
                            warn!(key = %key, error = %err, "failed to release dropped lock");
                        }
                    });
                }
                // the lease reclaims it
                Err(_) => warn!(key = %token.key, "no runtime to release dropped lock"),
            },
            None => {}
        }
    }
}

/// A fairytale loaded while its exclusion token is held. The like counter can
/// only be changed through this handle.
#[derive(Debug)]
pub struct LockedFairytale<'t> {
    token: &'t ExclusionToken,
    fairytale: Fairytale,
    loaded_count: u64,
}

impl<'t> LockedFairytale<'t> {
    pub fn new(token: &'t ExclusionToken, fairytale: Fairytale) -> AppResult<Self> {
        if token.fairytale() != &fairytale.id {
            return Err(AppError::Generic {
                description: format!(
                    "lock on {} does not cover {}",
                    token.fairytale(),
                    fairytale.id
                ),
            });
        }
        let loaded_count = fairytale.like_count();
        Ok(Self {
            token,
            fairytale,
            loaded_count,
        })
    }

    pub fn id(&self) -> &Thing {
        self.token.fairytale()
    }

    pub fn like_count(&self) -> u64 {
        self.fairytale.like_count()
    }

    pub fn increase_like_count(&mut self) {
        self.fairytale.increase_like_count();
    }

    pub fn decrease_like_count(&mut self) {
        self.fairytale.decrease_like_count();
    }

    /// Change made to the counter since it was loaded, floored decrements included.
    pub fn like_count_delta(&self) -> i64 {
        self.fairytale.like_count() as i64 - self.loaded_count as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::row_lock::RowLocks;
    use crate::services::distributed_exclusion::{like_lock_key, DistributedExclusion};
    use crate::utils::lock::memory_lock::InMemoryLockService;
    use crate::utils::lock::RetryPolicy;
    use std::str::FromStr;
    use std::time::Duration;

    fn fairytale(id: &str) -> Fairytale {
        Fairytale::stub(id, None)
    }

    #[test]
    fn strategy_parses_from_config_value() {
        assert_eq!(
            LockStrategy::from_str("pessimistic").unwrap(),
            LockStrategy::Pessimistic
        );
        assert_eq!(
            LockStrategy::from_str("Distributed").unwrap(),
            LockStrategy::Distributed
        );
        assert!(LockStrategy::from_str("optimistic").is_err());
        assert_eq!(LockStrategy::Pessimistic.to_string(), "pessimistic");
    }

    #[tokio::test]
    async fn locked_fairytale_must_match_token() {
        let locks = RowLocks::new();
        let id = Thing::from(("fairytale", "a"));
        let guard = locks
            .lock(id.to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        let token = ExclusionToken::row(id, guard);

        assert!(LockedFairytale::new(&token, fairytale("b")).is_err());

        let mut locked = LockedFairytale::new(&token, fairytale("a")).unwrap();
        locked.decrease_like_count();
        assert_eq!(locked.like_count(), 0);
        assert_eq!(locked.like_count_delta(), 0);
        locked.increase_like_count();
        assert_eq!(locked.like_count(), 1);
        assert_eq!(locked.like_count_delta(), 1);
    }

    #[tokio::test]
    async fn delta_counts_from_loaded_value() {
        let locks = RowLocks::new();
        let id = Thing::from(("fairytale", "a"));
        let guard = locks
            .lock(id.to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        let token = ExclusionToken::row(id, guard);

        let mut locked = LockedFairytale::new(&token, Fairytale::stub("a", Some(3))).unwrap();
        locked.decrease_like_count();
        assert_eq!(locked.like_count(), 2);
        assert_eq!(locked.like_count_delta(), -1);
    }

    #[tokio::test]
    async fn dropped_row_token_frees_the_row() {
        let locks = RowLocks::new();
        let id = Thing::from(("fairytale", "a"));
        let guard = locks
            .lock(id.to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        let token = ExclusionToken::row(id.clone(), guard);
        assert!(locks.is_locked(&id.to_string()));

        drop(token);
        assert!(!locks.is_locked(&id.to_string()));
        assert!(locks.is_empty());
    }

    fn lease_locks() -> (Arc<InMemoryLockService>, DistributedExclusion) {
        let locks = Arc::new(InMemoryLockService::new(RetryPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
        )));
        let exclusion = DistributedExclusion::new(
            locks.clone(),
            Duration::from_secs(30),
            Duration::from_secs(5),
        );
        (locks, exclusion)
    }

    #[tokio::test]
    async fn dropped_distributed_token_frees_the_key() {
        let (locks, exclusion) = lease_locks();
        let id = Thing::from(("fairytale", "a"));
        let key = like_lock_key(&id);

        let token = exclusion.acquire(&id).await.unwrap();
        assert!(locks.is_locked(&key));
        drop(token);

        let started = Instant::now();
        let again = locks
            .acquire(&key, Duration::from_secs(30), Duration::from_secs(5))
            .await;
        assert!(again.is_ok());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn panicking_holder_frees_the_key() {
        let (locks, exclusion) = lease_locks();
        let exclusion = Arc::new(exclusion);
        let id = Thing::from(("fairytale", "a"));
        let key = like_lock_key(&id);

        let holder = {
            let exclusion = exclusion.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _token = exclusion.acquire(&id).await.unwrap();
                panic!("holder failed mid operation");
            })
        };
        assert!(holder.await.unwrap_err().is_panic());

        let started = Instant::now();
        let again = exclusion.acquire(&id).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));

        again.release().await.unwrap();
        assert!(!locks.is_locked(&key));
    }
}
