use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::interfaces::repositories::fairytale::FairytalesRepositoryInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::middleware::mw_ctx::CtxState;
use crate::routes::likes::like_service;

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new().route("/api/fairytales/:fairytale_id", get(get_fairytale))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FairytaleView {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub is_public: bool,
    pub like_count: u64,
    pub liked: bool,
}

async fn get_fairytale(
    ctx: Ctx,
    Path(fairytale_id): Path<String>,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<FairytaleView>> {
    let fairytale = state
        .db
        .fairytales
        .get(&fairytale_id)
        .await
        .map_err(|e| ctx.to_ctx_error(e))?
        .ok_or(ctx.to_ctx_error(AppError::FairytaleNotFound {
            fairytale_id: fairytale_id.clone(),
        }))?;

    // anonymous readers see the count only
    let liked = match ctx.user_id() {
        Ok(user_id) => like_service(&state)
            .is_liked(&user_id, &fairytale_id)
            .await
            .map_err(|e| ctx.to_ctx_error(e))?,
        Err(_) => false,
    };

    Ok(Json(FairytaleView {
        id: fairytale.id.id.to_raw(),
        title: fairytale.title.clone(),
        content: fairytale.content.clone(),
        is_public: fairytale.is_public,
        like_count: fairytale.like_count(),
        liked,
    }))
}
