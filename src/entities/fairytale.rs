use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fairytale {
    pub id: Thing,
    #[serde(default)]
    pub created_by: Option<Thing>,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    // NONE in storage reads as zero
    #[serde(default)]
    like_count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Fairytale {
    pub fn like_count(&self) -> u64 {
        self.like_count.unwrap_or(0).max(0) as u64
    }

    pub(crate) fn increase_like_count(&mut self) {
        self.like_count = Some(self.like_count() as i64 + 1);
    }

    pub(crate) fn decrease_like_count(&mut self) {
        self.like_count = Some(self.like_count().saturating_sub(1) as i64);
    }

    #[cfg(test)]
    pub(crate) fn stub(id: &str, like_count: Option<i64>) -> Self {
        Fairytale {
            id: Thing::from(("fairytale", id)),
            created_by: None,
            title: "The Snow Queen".to_string(),
            content: None,
            is_public: true,
            like_count,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFairytale {
    pub title: String,
    pub content: Option<String>,
    pub created_by: Option<Thing>,
    pub is_public: bool,
}
