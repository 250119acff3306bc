use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::entities::fairytale::CreateFairytale;
use crate::interfaces::repositories::fairytale::FairytalesRepositoryInterface;
use crate::interfaces::repositories::user::UsersRepositoryInterface;
use crate::middleware::{error::AppResult, mw_ctx::CtxState};
use crate::routes::{fairytales, likes};

pub fn main_router(ctx_state: &Arc<CtxState>) -> Router {
    Router::new()
        .route("/hc", get(get_hc))
        .merge(likes::routes())
        .merge(fairytales::routes())
        .with_state(ctx_state.clone())
        .layer(TraceLayer::new_for_http())
}

async fn get_hc() -> Response {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    (StatusCode::OK, format!("v{}", VERSION)).into_response()
}

pub async fn create_default_data_for_dev(ctx_state: &CtxState) -> AppResult<()> {
    if !ctx_state.is_development {
        return Ok(());
    }
    let user = ctx_state.db.users.create("storyteller").await?;
    let fairytale = ctx_state
        .db
        .fairytales
        .create(CreateFairytale {
            title: "The Little Mermaid".to_string(),
            content: Some("Far out in the ocean, the water is as blue as cornflowers.".to_string()),
            created_by: Some(user.id.clone()),
            is_public: true,
        })
        .await?;
    info!(
        user_id = %user.id.id.to_raw(),
        fairytale_id = %fairytale.id.id.to_raw(),
        "->> created dev data"
    );
    Ok(())
}
