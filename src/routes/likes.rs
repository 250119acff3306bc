use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::repositories::{
    fairytale::FairytalesRepository, like::LikesRepository, user::UsersRepository,
};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::CtxResult;
use crate::middleware::mw_ctx::CtxState;
use crate::services::like_service::LikeService;

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route(
            "/api/like/:fairytale_id",
            post(add_like).delete(remove_like).get(is_liked),
        )
        .route("/api/likes", get(get_likes))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: String,
    pub fairytale_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeStatusResponse {
    pub fairytale_id: String,
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikedFairytale {
    pub fairytale_id: String,
}

pub(crate) fn like_service(
    state: &CtxState,
) -> LikeService<'_, LikesRepository, FairytalesRepository, UsersRepository> {
    LikeService::new(
        &state.db.likes,
        state.db.fairytales.as_ref(),
        &state.db.users,
        state.exclusion.as_ref(),
    )
}

async fn add_like(
    ctx: Ctx,
    Path(fairytale_id): Path<String>,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<LikeResponse>> {
    let user_id = ctx.user_id()?;
    let like = like_service(&state)
        .add_like(&user_id, &fairytale_id)
        .await
        .map_err(|e| ctx.to_ctx_error(e))?;

    Ok(Json(LikeResponse {
        id: like.id.id.to_raw(),
        fairytale_id: like.fairytale.id.to_raw(),
        created_at: like.created_at,
    }))
}

async fn remove_like(
    ctx: Ctx,
    Path(fairytale_id): Path<String>,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<StatusCode> {
    let user_id = ctx.user_id()?;
    like_service(&state)
        .remove_like(&user_id, &fairytale_id)
        .await
        .map_err(|e| ctx.to_ctx_error(e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn is_liked(
    ctx: Ctx,
    Path(fairytale_id): Path<String>,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<LikeStatusResponse>> {
    let user_id = ctx.user_id()?;
    let liked = like_service(&state)
        .is_liked(&user_id, &fairytale_id)
        .await
        .map_err(|e| ctx.to_ctx_error(e))?;
    Ok(Json(LikeStatusResponse {
        fairytale_id,
        liked,
    }))
}

async fn get_likes(
    ctx: Ctx,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<Vec<LikedFairytale>>> {
    let user_id = ctx.user_id()?;
    let ids = like_service(&state)
        .get_likes(&user_id)
        .await
        .map_err(|e| ctx.to_ctx_error(e))?;
    Ok(Json(
        ids.into_iter()
            .map(|fairytale_id| LikedFairytale { fairytale_id })
            .collect(),
    ))
}
