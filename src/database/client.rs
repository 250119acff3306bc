use std::sync::Arc;

use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::info;

use super::repositories::fairytale::FairytalesRepository;
use super::repositories::like::LikesRepository;
use super::repositories::user::UsersRepository;
use crate::middleware::error::AppResult;

pub type Db = Surreal<Any>;

#[derive(Debug)]
pub struct DbConfig<'a> {
    pub url: &'a str,
    pub database: &'a str,
    pub namespace: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

#[derive(Debug)]
pub struct Database {
    pub client: Arc<Db>,
    pub users: UsersRepository,
    pub fairytales: Arc<FairytalesRepository>,
    pub likes: LikesRepository,
}

impl Database {
    pub async fn connect(config: DbConfig<'_>) -> AppResult<Self> {
        info!(
            url = config.url,
            namespace = config.namespace,
            database = config.database,
            "->> connecting DB"
        );
        let conn = connect(config.url).await?;

        if let (Some(username), Some(password)) = (config.username, config.password) {
            conn.signin(Root { username, password }).await?;
        }

        conn.use_ns(config.namespace)
            .use_db(config.database)
            .await?;

        let version = conn.version().await?;
        info!("->> connected DB version: {version}");

        let client = Arc::new(conn);
        Ok(Self {
            users: UsersRepository::new(client.clone()),
            fairytales: Arc::new(FairytalesRepository::new(client.clone())),
            likes: LikesRepository::new(client.clone()),
            client,
        })
    }

    pub async fn run_migrations(&self) -> AppResult<()> {
        self.users.mutate_db().await?;
        self.fairytales.mutate_db().await?;
        self.likes.mutate_db().await?;
        Ok(())
    }
}
