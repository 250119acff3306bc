use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// One `local_user -> likes -> fairytale` relation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub id: Thing,
    #[serde(rename = "in")]
    pub user: Thing,
    #[serde(rename = "out")]
    pub fairytale: Thing,
    pub created_at: DateTime<Utc>,
}
