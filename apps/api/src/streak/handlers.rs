use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::streak::{compute_streak, effective_streak, StreakOutcome, StreakState};

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    #[serde(flatten)]
    pub streak: StreakState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StreakOutcome>,
}

fn streak_state(user: &User) -> StreakState {
    StreakState {
        current_streak: user.current_streak,
        longest_streak: user.longest_streak,
        last_active_at: user.last_active_at,
    }
}

/// GET /api/streak
pub async fn handle_get_streak(AuthUser(user): AuthUser) -> Json<StreakResponse> {
    let mut streak = streak_state(&user);
    streak.current_streak = effective_streak(&streak, Utc::now());
    Json(StreakResponse {
        streak,
        outcome: None,
    })
}

/// POST /api/streak
///
/// Records today's activity for the user.
pub async fn handle_record_streak(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<StreakResponse>, AppError> {
    let (streak, outcome) = compute_streak(streak_state(&user), Utc::now());

    if outcome != StreakOutcome::AlreadyCounted {
        sqlx::query(
            r#"
            UPDATE users
            SET current_streak = $1, longest_streak = $2, last_active_at = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(streak.current_streak)
        .bind(streak.longest_streak)
        .bind(streak.last_active_at)
        .bind(user.id)
        .execute(&state.db)
        .await?;

        info!(
            "Streak {:?} for user {}: now {}",
            outcome, user.id, streak.current_streak
        );
    }

    Ok(Json(StreakResponse {
        streak,
        outcome: Some(outcome),
    }))
}
