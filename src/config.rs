use std::time::Duration;

use crate::services::exclusion::LockStrategy;
use crate::utils::lock::RetryPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_namespace: String,
    pub db_database: String,
    pub db_password: Option<String>,
    pub db_username: Option<String>,
    pub db_url: String,
    pub http_port: u16,
    pub is_development: bool,
    pub sentry_project_link: Option<String>,
    pub lock: LockConfig,
}

#[derive(Debug, Clone)]
pub struct LockConfig {
    pub strategy: LockStrategy,
    pub wait_timeout: Duration,
    pub lease: Duration,
    pub retry: RetryPolicy,
    /// Strategy `distributed` uses Redis when set, the in-process lease table otherwise.
    pub redis_url: Option<String>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            strategy: LockStrategy::Distributed,
            wait_timeout: Duration::from_millis(5000),
            lease: Duration::from_millis(3000),
            retry: RetryPolicy::default(),
            redis_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_namespace = var("DB_NAMESPACE").unwrap_or("namespace".to_string());
        let db_database = var("DB_DATABASE").unwrap_or("database".to_string());
        let db_password = var("DB_PASSWORD");
        let db_username = var("DB_USERNAME");
        let db_url = var("DB_URL").unwrap_or("mem://".to_string());

        let http_port = var("HTTP_PORT").map_or(8080, |v| {
            v.parse::<u16>().expect("HTTP_PORT must be a port number")
        });
        let is_development = var("DEVELOPMENT").map_or(false, |v| v.eq("true"));
        let sentry_project_link = var("SENTRY_PROJECT_LINK").filter(|v| !v.is_empty());

        let defaults = LockConfig::default();
        let strategy = var("LIKE_LOCK_STRATEGY").map_or(defaults.strategy, |v| {
            v.parse::<LockStrategy>()
                .expect("LIKE_LOCK_STRATEGY must be pessimistic or distributed")
        });
        let millis = |name: &str, default: Duration| {
            var(name).map_or(default, |v| {
                Duration::from_millis(v.parse::<u64>().unwrap_or_else(|_| {
                    panic!("{name} must be a number of milliseconds")
                }))
            })
        };
        let lock = LockConfig {
            strategy,
            wait_timeout: millis("LIKE_LOCK_WAIT_MS", defaults.wait_timeout),
            lease: millis("LIKE_LOCK_LEASE_MS", defaults.lease),
            retry: RetryPolicy::new(
                millis("LIKE_LOCK_RETRY_INITIAL_MS", defaults.retry.initial),
                millis("LIKE_LOCK_RETRY_MAX_MS", defaults.retry.max),
            ),
            redis_url: var("REDIS_URL").filter(|v| !v.is_empty()),
        };

        Self {
            db_namespace,
            db_database,
            db_password,
            db_username,
            db_url,
            http_port,
            is_development,
            sentry_project_link,
            lock,
        }
    }
}
