use std::sync::Arc;
use std::time::Duration;

use axum_test::{TestResponse, TestServer};
use fairytale_server::database::repositories::{
    fairytale::FairytalesRepository, like::LikesRepository, user::UsersRepository,
};
use fairytale_server::entities::fairytale::{CreateFairytale, Fairytale};
use fairytale_server::entities::user::User;
use fairytale_server::interfaces::repositories::fairytale::FairytalesRepositoryInterface;
use fairytale_server::interfaces::repositories::like::LikesRepositoryInterface;
use fairytale_server::interfaces::repositories::user::UsersRepositoryInterface;
use fairytale_server::middleware::mw_ctx::CtxState;
use fairytale_server::services::distributed_exclusion::DistributedExclusion;
use fairytale_server::services::exclusion::{LockStrategy, ResourceExclusion};
use fairytale_server::services::like_service::LikeService;
use fairytale_server::services::row_lock_exclusion::RowLockExclusion;
use fairytale_server::utils::lock::memory_lock::InMemoryLockService;
use fake::{faker, Fake};
use surrealdb::sql::Thing;

pub type TestLikeService<'a> =
    LikeService<'a, LikesRepository, FairytalesRepository, UsersRepository>;

#[allow(dead_code)]
pub fn like_service(state: &CtxState) -> TestLikeService<'_> {
    like_service_with(state, state.exclusion.as_ref())
}

#[allow(dead_code)]
pub fn like_service_with<'a>(
    state: &'a CtxState,
    exclusion: &'a dyn ResourceExclusion,
) -> TestLikeService<'a> {
    LikeService::new(
        &state.db.likes,
        state.db.fairytales.as_ref(),
        &state.db.users,
        exclusion,
    )
}

/// Same strategy as the server state but giving up after `wait`. The
/// pessimistic one shares the repository row locks, the distributed one owns
/// a fresh lease table.
#[allow(dead_code)]
pub fn short_wait_exclusion(state: &CtxState, wait: Duration) -> Arc<dyn ResourceExclusion> {
    match state.exclusion.strategy() {
        LockStrategy::Pessimistic => {
            Arc::new(RowLockExclusion::new(state.db.fairytales.clone(), wait))
        }
        LockStrategy::Distributed => Arc::new(DistributedExclusion::new(
            Arc::new(InMemoryLockService::default()),
            Duration::from_secs(30),
            wait,
        )),
    }
}

#[allow(dead_code)]
pub async fn create_fake_user(state: &CtxState) -> User {
    let username: String = faker::internet::en::Username().fake();
    let suffix: u32 = (0..u32::MAX).fake();
    state
        .db
        .users
        .create(&format!("{username}_{suffix}"))
        .await
        .expect("user created")
}

#[allow(dead_code)]
pub async fn create_fake_users(state: &Arc<CtxState>, count: usize) -> Vec<User> {
    let mut users = Vec::with_capacity(count);
    for _ in 0..count {
        users.push(create_fake_user(state).await);
    }
    users
}

#[allow(dead_code)]
pub async fn create_fake_fairytale(state: &CtxState) -> Fairytale {
    let title: String = faker::lorem::en::Sentence(2..5).fake();
    let content: String = faker::lorem::en::Paragraph(2..4).fake();
    state
        .db
        .fairytales
        .create(CreateFairytale {
            title,
            content: Some(content),
            created_by: None,
            is_public: true,
        })
        .await
        .expect("fairytale created")
}

#[allow(dead_code)]
pub fn key(thing: &Thing) -> String {
    thing.id.to_raw()
}

/// Counter stored on the fairytale record.
#[allow(dead_code)]
pub async fn stored_like_count(state: &CtxState, fairytale: &Fairytale) -> u64 {
    state
        .db
        .fairytales
        .get(&key(&fairytale.id))
        .await
        .unwrap()
        .expect("fairytale exists")
        .like_count()
}

/// Number of like rows pointing at the fairytale.
#[allow(dead_code)]
pub async fn like_rows(state: &CtxState, fairytale: &Fairytale) -> u64 {
    state
        .db
        .likes
        .count_by_fairytale(&fairytale.id)
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn assert_count_matches_rows(state: &CtxState, fairytale: &Fairytale, expected: u64) {
    assert_eq!(stored_like_count(state, fairytale).await, expected);
    assert_eq!(like_rows(state, fairytale).await, expected);
}

/// Writes the counter directly, bypassing the like engine.
#[allow(dead_code)]
pub async fn force_like_count(state: &CtxState, fairytale: &Fairytale, count: i64) {
    state
        .db
        .client
        .query("UPDATE $id SET like_count=$count;")
        .bind(("id", fairytale.id.clone()))
        .bind(("count", count))
        .await
        .unwrap()
        .check()
        .unwrap();
}

#[allow(dead_code)]
pub async fn post_like(server: &TestServer, user: &User, fairytale_id: &str) -> TestResponse {
    server
        .post(format!("/api/like/{fairytale_id}").as_str())
        .add_header("X-User-Id", key(&user.id))
        .add_header("Accept", "application/json")
        .await
}

#[allow(dead_code)]
pub async fn delete_like(server: &TestServer, user: &User, fairytale_id: &str) -> TestResponse {
    server
        .delete(format!("/api/like/{fairytale_id}").as_str())
        .add_header("X-User-Id", key(&user.id))
        .add_header("Accept", "application/json")
        .await
}

/// Redefines the counter field with an extra `ASSERT`, so counter writes that
/// break it fail inside the like transaction. `None` restores the plain field.
#[allow(dead_code)]
pub async fn constrain_like_count(state: &CtxState, assert: Option<&str>) {
    let assert = assert.map(|a| format!(" ASSERT {a}")).unwrap_or_default();
    state
        .db
        .client
        .query(format!(
            "DEFINE FIELD OVERWRITE like_count ON fairytale TYPE option<int> DEFAULT 0{assert};"
        ))
        .await
        .unwrap()
        .check()
        .unwrap();
}
