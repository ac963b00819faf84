//! Request authentication
//!
//! Access tokens are HS256 JWTs sent as `Authorization: Bearer <token>`.
//! The subject is the acting user's ID.

pub mod extractor;
pub mod jwt;

pub use extractor::AuthUser;
pub use jwt::{issue_access_token, AccessClaims, JwtValidator};

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tubely_core::AppError;

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Invalid authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthenticated("Expected a bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthenticated("Empty bearer token".to_string()));
    }

    Ok(token)
}
