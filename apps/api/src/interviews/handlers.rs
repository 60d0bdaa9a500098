use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::interviews::quiz::{generate_quiz, grade, improvement_tip, normalize_category, QuizQuestion};
use crate::interviews::voice::{evaluate_transcript, validate_request, VoiceInterviewRequest};
use crate::interviews::{compute_stats, AssessmentStats};
use crate::models::interview::{AssessmentRow, VoiceInterviewRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub category: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAssessmentRequest {
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<String>,
    pub category: Option<String>,
}

/// POST /api/interviews/quiz
///
/// Generated questions are returned to the client, not stored.
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    request: Option<Json<QuizRequest>>,
) -> Result<Json<QuizResponse>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let category = normalize_category(request.category.as_deref())?;
    let questions = generate_quiz(&state.llm, &category, &user).await?;
    Ok(Json(QuizResponse {
        category,
        questions,
    }))
}

/// POST /api/interviews/assessments
pub async fn handle_save_assessment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<SaveAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentRow>), AppError> {
    let category = normalize_category(request.category.as_deref())?;
    let quiz = grade(request.questions, &request.answers)?;
    let tip = improvement_tip(&state.llm, &category, &quiz, &user).await;

    let questions = serde_json::to_value(&quiz.questions)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize questions: {e}")))?;

    let assessment = sqlx::query_as::<_, AssessmentRow>(
        r#"
        INSERT INTO assessments (id, user_id, category, questions, quiz_score, improvement_tip)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&category)
    .bind(&questions)
    .bind(quiz.score)
    .bind(&tip)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Saved {category} assessment {} for user {} with score {:.1}",
        assessment.id, user.id, assessment.quiz_score
    );
    Ok((StatusCode::CREATED, Json(assessment)))
}

/// GET /api/interviews/assessments
pub async fn handle_list_assessments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<AssessmentRow>>, AppError> {
    let assessments = sqlx::query_as::<_, AssessmentRow>(
        "SELECT * FROM assessments WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(assessments))
}

/// GET /api/interviews/stats
pub async fn handle_assessment_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AssessmentStats>, AppError> {
    let scores: Vec<f64> = sqlx::query_scalar(
        "SELECT quiz_score FROM assessments WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(compute_stats(&scores)))
}

/// POST /api/interviews/voice
pub async fn handle_create_voice_interview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<VoiceInterviewRequest>,
) -> Result<(StatusCode, Json<VoiceInterviewRow>), AppError> {
    let (role, transcript) = validate_request(&request)?;
    let feedback = evaluate_transcript(&state.llm, &role, &transcript, &user).await?;

    let feedback_json = serde_json::to_value(&feedback)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize feedback: {e}")))?;

    let interview = sqlx::query_as::<_, VoiceInterviewRow>(
        r#"
        INSERT INTO voice_interviews (id, user_id, role, transcript, score, feedback)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&role)
    .bind(&transcript)
    .bind(feedback.score)
    .bind(&feedback_json)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Saved voice interview {} for user {} with score {}",
        interview.id, user.id, interview.score
    );
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/interviews/voice
pub async fn handle_list_voice_interviews(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<VoiceInterviewRow>>, AppError> {
    let interviews = sqlx::query_as::<_, VoiceInterviewRow>(
        "SELECT * FROM voice_interviews WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(interviews))
}

/// GET /api/interviews/voice/:id
pub async fn handle_get_voice_interview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<VoiceInterviewRow>, AppError> {
    sqlx::query_as::<_, VoiceInterviewRow>(
        "SELECT * FROM voice_interviews WHERE id = $1 AND user_id = $2",
    )
    .bind(interview_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Voice interview {interview_id} not found")))
}

/// DELETE /api/interviews/voice/:id
pub async fn handle_delete_voice_interview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(interview_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM voice_interviews WHERE id = $1 AND user_id = $2")
        .bind(interview_id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Voice interview {interview_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
