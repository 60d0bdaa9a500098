use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::courses::generator::{generate_course, validate_request, CreateCourseRequest};
use crate::courses::{compute_progress, update_completed_chapters};
use crate::errors::AppError;
use crate::models::course::CourseRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChapterProgressRequest {
    pub chapter_index: i32,
    pub completed: bool,
}

/// Loads a course owned by `user_id`, or 404.
pub async fn find_owned_course(
    pool: &sqlx::PgPool,
    course_id: Uuid,
    user_id: Uuid,
) -> Result<CourseRow, AppError> {
    sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = $1 AND user_id = $2")
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))
}

/// POST /api/courses
pub async fn handle_create_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseRow>), AppError> {
    let spec = validate_request(request)?;
    let generated = generate_course(&state.llm, &spec, &user).await?;

    let chapters = serde_json::to_value(&generated.parsed.chapters)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize chapters: {e}")))?;
    let chapter_count = i32::try_from(generated.parsed.chapters.len())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Too many chapters: {e}")))?;

    let course = sqlx::query_as::<_, CourseRow>(
        r#"
        INSERT INTO courses
            (id, user_id, title, description, level, raw_markdown, chapters, chapter_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&generated.parsed.title)
    .bind(&spec.description)
    .bind(&spec.level)
    .bind(&generated.raw_markdown)
    .bind(&chapters)
    .bind(chapter_count)
    .fetch_one(&state.db)
    .await?;

    info!("Created course {} for user {}", course.id, user.id);
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /api/courses
pub async fn handle_list_courses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CourseRow>>, AppError> {
    let courses = sqlx::query_as::<_, CourseRow>(
        "SELECT * FROM courses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(courses))
}

/// GET /api/courses/:id
pub async fn handle_get_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseRow>, AppError> {
    Ok(Json(find_owned_course(&state.db, course_id, user.id).await?))
}

/// PATCH /api/courses/:id/progress
///
/// Completing the last chapter stamps `completed_at`; un-completing clears it.
pub async fn handle_update_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
    Json(request): Json<ChapterProgressRequest>,
) -> Result<Json<CourseRow>, AppError> {
    let course = find_owned_course(&state.db, course_id, user.id).await?;

    let completed = update_completed_chapters(
        &course.completed_chapters,
        request.chapter_index,
        course.chapter_count,
        request.completed,
    )?;
    let progress = compute_progress(completed.len(), course.chapter_count);

    let course = sqlx::query_as::<_, CourseRow>(
        r#"
        UPDATE courses
        SET completed_chapters = $1,
            progress = $2,
            completed_at = CASE
                WHEN $2 >= 100 THEN COALESCE(completed_at, NOW())
                ELSE NULL
            END,
            updated_at = NOW()
        WHERE id = $3 AND user_id = $4
        RETURNING *
        "#,
    )
    .bind(&completed)
    .bind(progress)
    .bind(course_id)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(course))
}

/// DELETE /api/courses/:id
pub async fn handle_delete_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND user_id = $2")
        .bind(course_id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Course {course_id} not found")));
    }
    info!("Deleted course {course_id} for user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}
