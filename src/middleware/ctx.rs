use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::error::{AppError, AppResult, CtxError, CtxResult};
use crate::database::table_names::USER_TABLE_NAME;
use crate::middleware::mw_ctx::CtxState;

/// Header set by the authenticating proxy in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone, Debug)]
pub struct Ctx {
    result_user_id: AppResult<String>,
    req_id: Uuid,
}

impl Ctx {
    pub fn new(result_user_id: AppResult<String>) -> Self {
        Self {
            result_user_id,
            req_id: Uuid::new_v4(),
        }
    }

    /// Record key of the calling user, with any `local_user:` prefix removed.
    pub fn user_id(&self) -> CtxResult<String> {
        let id = self
            .result_user_id
            .clone()
            .map_err(|error| self.to_ctx_error(error))?;
        let prefix = format!("{USER_TABLE_NAME}:");
        match id.strip_prefix(&prefix) {
            Some(key) => Ok(key.to_string()),
            None => Ok(id),
        }
    }

    pub fn to_ctx_error(&self, error: AppError) -> CtxError {
        CtxError {
            error,
            req_id: self.req_id,
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<CtxState>> for Ctx {
    type Rejection = CtxError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<CtxState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::AuthFailNoUserId);

        Ok(Ctx::new(user_id))
    }
}
