use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use tubely_core::AppError;
use uuid::Uuid;

use super::bearer_token;
use crate::error::HttpAppError;
use crate::state::AppState;

/// The authenticated caller of a request.
///
/// Rejects with 401 when the token is missing, invalid or names a user that
/// no longer exists.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    /// Validate the request headers and resolve the user.
    pub async fn authenticate(
        state: &AppState,
        headers: &axum::http::HeaderMap,
    ) -> Result<Self, AppError> {
        let token = bearer_token(headers)?;
        let user_id = state.jwt.validate(token)?;

        state
            .db
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User no longer exists".to_string()))?;

        Ok(Self { user_id })
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthUser::authenticate(state, &parts.headers).await?)
    }
}
