use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

use super::RetryPolicy;
use crate::interfaces::distributed_lock::{DistributedLockInterface, LockToken};
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug)]
struct Lease {
    owner: String,
    expires_at: Instant,
}

/// Lease table for deployments running a single server process.
#[derive(Debug)]
pub struct InMemoryLockService {
    leases: DashMap<String, Lease>,
    // waiters per key, removed once nobody waits
    released: DashMap<String, Arc<Notify>>,
    retry: RetryPolicy,
}

impl InMemoryLockService {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            leases: DashMap::new(),
            released: DashMap::new(),
            retry,
        }
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.leases
            .get(key)
            .map(|lease| lease.expires_at > Instant::now())
            .unwrap_or(false)
    }

    fn waiters(&self, key: &str) -> Arc<Notify> {
        self.released.entry(key.to_string()).or_default().value().clone()
    }

    fn wake_waiters(&self, key: &str) {
        if let Some(waiters) = self.released.get(key) {
            waiters.notify_waiters();
        }
        self.released
            .remove_if(key, |_, waiters| Arc::strong_count(waiters) == 1);
    }

    fn try_acquire(&self, key: &str, owner: &str, lease: Duration) -> bool {
        let now = Instant::now();
        let next = Lease {
            owner: owner.to_string(),
            expires_at: now + lease,
        };
        match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut current) => {
                if current.get().expires_at > now {
                    return false;
                }
                warn!(key, previous_owner = %current.get().owner, "taking over expired lease");
                current.insert(next);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(next);
                true
            }
        }
    }
}

impl Default for InMemoryLockService {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[async_trait]
impl DistributedLockInterface for InMemoryLockService {
    async fn acquire(&self, key: &str, lease: Duration, wait: Duration) -> AppResult<LockToken> {
        let owner = Uuid::new_v4().to_string();
        let deadline = Instant::now() + wait;
        let mut delays = self.retry.delays();

        loop {
            // registered before the attempt so a release in between is not missed
            let waiters = self.waiters(key);
            let released = waiters.notified();
            tokio::pin!(released);

            if self.try_acquire(key, &owner, lease) {
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
            tokio::select! {
                _ = &mut released => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn release(&self, token: LockToken) -> AppResult<bool> {
        let now = Instant::now();
        let removed = self
            .leases
            .remove_if(&token.key, |_, lease| lease.owner == token.owner);
        match removed {
            Some((_, lease)) => {
                self.wake_waiters(&token.key);
                Ok(lease.expires_at > now)
            }
            None => Ok(false),
        }
    }
}
