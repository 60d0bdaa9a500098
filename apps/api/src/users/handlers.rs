use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthUser, ClerkIdentity};
use crate::errors::AppError;
use crate::insights::{generate_insight, insert_if_missing};
use crate::models::user::User;
use crate::state::AppState;
use crate::users::{validate_onboarding, OnboardingRequest};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub is_onboarded: bool,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        let is_onboarded = user.is_onboarded();
        MeResponse { user, is_onboarded }
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncUserRequest {
    pub email: String,
    pub name: Option<String>,
}

/// GET /api/users/me
pub async fn handle_get_me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(user.into())
}

/// POST /api/users/sync
///
/// Creates or refreshes the row for the signed-in identity.
pub async fn handle_sync_user(
    State(state): State<AppState>,
    ClerkIdentity(clerk_user_id): ClerkIdentity,
    Json(request): Json<SyncUserRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let email = request.email.trim();
    if !email.contains('@') {
        return Err(AppError::Validation("email is invalid".to_string()));
    }
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, clerk_user_id, email, name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (clerk_user_id) DO UPDATE
            SET email = EXCLUDED.email,
                name = COALESCE(EXCLUDED.name, users.name),
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&clerk_user_id)
    .bind(email)
    .bind(name)
    .fetch_one(&state.db)
    .await?;

    info!("Synced user {} ({clerk_user_id})", user.id);
    Ok(Json(user.into()))
}

/// POST /api/users/onboarding
///
/// The insight is generated before the transaction opens so no connection
/// is held across the LLM call.
pub async fn handle_onboarding(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let profile = validate_onboarding(&request)?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM industry_insights WHERE industry = $1)",
    )
    .bind(&profile.industry)
    .fetch_one(&state.db)
    .await?;

    let insight = if exists {
        None
    } else {
        Some(generate_insight(&state.llm, &profile.industry).await?)
    };

    let mut tx = state.db.begin().await?;

    if let Some(data) = &insight {
        insert_if_missing(&mut *tx, &profile.industry, data, Utc::now()).await?;
    }

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET industry = $1, experience_years = $2, bio = $3, skills = $4, updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(&profile.industry)
    .bind(profile.experience_years)
    .bind(&profile.bio)
    .bind(&profile.skills)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Onboarded user {} into {}", updated.id, profile.industry);
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::test_user;

    #[test]
    fn test_me_response_flags_onboarding() {
        let json = serde_json::to_value(MeResponse::from(test_user())).unwrap();
        assert_eq!(json["is_onboarded"], true);
        assert_eq!(json["email"], "ada@example.com");

        let mut user = test_user();
        user.industry = None;
        let json = serde_json::to_value(MeResponse::from(user)).unwrap();
        assert_eq!(json["is_onboarded"], false);
    }
}
