use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::insights::{generate_insight, insert_if_missing, refresh};
use crate::models::insight::IndustryInsightRow;
use crate::rate_limit::rate_limit_token;
use crate::state::AppState;

async fn find_insight(
    pool: &sqlx::PgPool,
    industry: &str,
) -> Result<Option<IndustryInsightRow>, AppError> {
    Ok(sqlx::query_as::<_, IndustryInsightRow>(
        "SELECT * FROM industry_insights WHERE industry = $1",
    )
    .bind(industry)
    .fetch_optional(pool)
    .await?)
}

/// Counts an insight regeneration against the caller's rate limit.
async fn check_regeneration_allowed(
    state: &AppState,
    headers: &HeaderMap,
    industry: &str,
) -> Result<(), AppError> {
    let token = rate_limit_token(headers);
    let decision = state.rate_limiter.check(&token).await?;
    if decision.allowed {
        return Ok(());
    }
    warn!("Insight generation for {industry} rate limited for {token}");
    Err(AppError::RateLimited {
        retry_after_secs: decision.reset_after.as_secs().max(1),
    })
}

/// Regenerates a stale insight. Falls back to the stored row when the LLM
/// call fails.
async fn refresh_stale(
    state: &AppState,
    headers: &HeaderMap,
    stale: IndustryInsightRow,
) -> Result<IndustryInsightRow, AppError> {
    check_regeneration_allowed(state, headers, &stale.industry).await?;

    let data = match generate_insight(&state.llm, &stale.industry).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Serving stale insight for {}: {e}", stale.industry);
            return Ok(stale);
        }
    };

    let mut conn = state.db.acquire().await?;
    let row = refresh(&mut conn, &stale.industry, &data, Utc::now()).await?;
    info!("Refreshed industry insight for {}", row.industry);
    Ok(row)
}

/// GET /api/insights
///
/// The user's industry insight, regenerated once `next_update` has passed.
pub async fn handle_get_insights(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
) -> Result<Json<IndustryInsightRow>, AppError> {
    let industry = user.industry.clone().ok_or(AppError::NotOnboarded)?;
    let now = Utc::now();

    if let Some(cached) = state.insight_cache.get(&industry) {
        if !cached.is_stale(now) {
            return Ok(Json(cached));
        }
        state.insight_cache.remove(&industry);
    }

    let insight = match find_insight(&state.db, &industry).await? {
        Some(row) if row.is_stale(now) => refresh_stale(&state, &headers, row).await?,
        Some(row) => row,
        None => {
            // Onboarding normally creates the row; rebuild it if it was removed.
            check_regeneration_allowed(&state, &headers, &industry).await?;
            let data = generate_insight(&state.llm, &industry).await?;
            let mut conn = state.db.acquire().await?;
            insert_if_missing(&mut conn, &industry, &data, now).await?;
            find_insight(&state.db, &industry).await?.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Insight for {industry} vanished after insert"))
            })?
        }
    };

    state.insight_cache.insert(industry, insight.clone());
    debug!("Insight cache holds {} industries", state.insight_cache.len());
    Ok(Json(insight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn test_regeneration_shares_the_callers_limit() {
        // test_state allows 2 requests per window.
        let state = test_state();
        let mut headers = HeaderMap::new();
        headers.insert("x-clerk-user-id", "user_123".parse().unwrap());

        for _ in 0..2 {
            check_regeneration_allowed(&state, &headers, "tech-software")
                .await
                .unwrap();
        }
        let result = check_regeneration_allowed(&state, &headers, "tech-software").await;
        assert!(matches!(result, Err(AppError::RateLimited { .. })));

        let other = HeaderMap::new();
        assert!(check_regeneration_allowed(&state, &other, "tech-software")
            .await
            .is_ok());
    }
}
