//! Request identity.
//!
//! Sign-in is handled by the identity provider in front of this service. The
//! provider's edge middleware verifies the session and forwards the user's id
//! in `x-clerk-user-id`; handlers only map that id to a `users` row.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const CLERK_USER_HEADER: &str = "x-clerk-user-id";

/// The verified identity-provider user id, without a database lookup.
#[derive(Debug, Clone)]
pub struct ClerkIdentity(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClerkIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CLERK_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| ClerkIdentity(v.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

/// The authenticated user's row. Rejects with 401 without identity and
/// 404 `USER_NOT_FOUND` when the identity has never been synced.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ClerkIdentity(clerk_user_id) = ClerkIdentity::from_request_parts(parts, state).await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE clerk_user_id = $1")
            .bind(&clerk_user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::UserNotFound)?;

        Ok(AuthUser(user))
    }
}
