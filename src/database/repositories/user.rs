use std::sync::Arc;

use async_trait::async_trait;
use crate::database::client::Db;
use crate::database::table_names::USER_TABLE_NAME;
use crate::entities::user::User;
use crate::interfaces::repositories::user::UsersRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug)]
pub struct UsersRepository {
    client: Arc<Db>,
}

impl UsersRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!(
            "
    DEFINE TABLE IF NOT EXISTS {USER_TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS username ON TABLE {USER_TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {USER_TABLE_NAME} TYPE datetime DEFAULT time::now();
    DEFINE INDEX IF NOT EXISTS username_idx ON TABLE {USER_TABLE_NAME} COLUMNS username UNIQUE;
    "
        );
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl UsersRepositoryInterface for UsersRepository {
    async fn create(&self, username: &str) -> AppResult<User> {
        let mut res = self
            .client
            .query(format!(
                "CREATE ONLY {USER_TABLE_NAME} SET username=$username;"
            ))
            .bind(("username", username.to_string()))
            .await?;
        let user = res.take::<Option<User>>(0)?;
        user.ok_or(AppError::Generic {
            description: format!("user {username} was not created"),
        })
    }

    async fn get(&self, user_id: &str) -> AppResult<Option<User>> {
        let user: Option<User> = self.client.select((USER_TABLE_NAME, user_id)).await?;
        Ok(user)
    }
}
