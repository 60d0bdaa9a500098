use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::llm_client::prompts::profile_line;
use crate::models::resume::{AtsScanRow, ResumeRow};
use crate::models::user::User;
use crate::resumes::ats::{score_resume, AtsReport};
use crate::resumes::extract::{detect_format, extract_text, upload_key};
use crate::resumes::prompts::{IMPROVE_PROMPT_TEMPLATE, IMPROVE_SYSTEM};
use crate::state::AppState;

const MAX_RESUME_CHARS: usize = 50_000;
const MAX_SECTION_CHARS: usize = 10_000;
const MAX_JOB_DESCRIPTION_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct SaveResumeRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub current: String,
    pub section: String,
}

#[derive(Debug, Serialize)]
pub struct ImproveResponse {
    pub improved: String,
}

#[derive(Debug, Serialize)]
pub struct AtsScanResponse {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AtsReport,
}

/// GET /api/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ResumeRow>, AppError> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// PUT /api/resume
pub async fn handle_save_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<SaveResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    if request.content.chars().count() > MAX_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "content must be at most {MAX_RESUME_CHARS} characters"
        )));
    }

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, content)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
            SET content = EXCLUDED.content, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&request.content)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(resume))
}

/// DELETE /api/resume
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM resumes WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Resume not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn build_improve_prompt(request: &ImproveRequest, user: &User) -> String {
    IMPROVE_PROMPT_TEMPLATE
        .replace("{section}", request.section.trim())
        .replace(
            "{profile}",
            &profile_line(user.industry.as_deref(), &user.skills),
        )
        .replace("{current}", request.current.trim())
}

/// POST /api/resume/improve
pub async fn handle_improve_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    if request.current.trim().is_empty() {
        return Err(AppError::Validation("current cannot be empty".to_string()));
    }
    if request.section.trim().is_empty() {
        return Err(AppError::Validation("section cannot be empty".to_string()));
    }
    if request.current.chars().count() > MAX_SECTION_CHARS {
        return Err(AppError::Validation(format!(
            "current must be at most {MAX_SECTION_CHARS} characters"
        )));
    }

    let prompt = build_improve_prompt(&request, &user);
    let improved = state
        .llm
        .call_text(&prompt, IMPROVE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Resume improvement failed: {e}")))?;

    Ok(Json(ImproveResponse { improved }))
}

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Resume must be at most 5 MiB".to_string())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

async fn read_scan_form(
    mut multipart: Multipart,
) -> Result<(UploadedFile, Option<String>), AppError> {
    let mut file = None;
    let mut job_description = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("job_description") => {
                let text = field.text().await.map_err(multipart_error)?;
                job_description = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;
    if job_description
        .as_ref()
        .is_some_and(|jd| jd.chars().count() > MAX_JOB_DESCRIPTION_CHARS)
    {
        return Err(AppError::Validation(format!(
            "job_description must be at most {MAX_JOB_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok((file, job_description))
}

/// POST /api/ats/scan
///
/// Extracts and scores the upload before archiving it, so unreadable files
/// never reach S3.
pub async fn handle_ats_scan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AtsScanResponse>), AppError> {
    let (file, job_description) = read_scan_form(multipart).await?;

    let format = detect_format(&file.file_name, file.content_type.as_deref())?;
    let text = extract_text(file.data.clone(), format).await?;
    let report = score_resume(&text, job_description.as_deref());

    let scan_id = Uuid::new_v4();
    let s3_key = upload_key(user.id, scan_id, &file.file_name);
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(file.data))
        .content_type(format.content_type())
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Resume upload failed: {e}")))?;
    info!("Uploaded resume to s3://{}/{}", state.config.s3_bucket, s3_key);

    let report_json = serde_json::to_value(&report)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize ATS report: {e}")))?;
    let score = i32::try_from(report.score)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("ATS score out of range: {e}")))?;

    let scan = sqlx::query_as::<_, AtsScanRow>(
        r#"
        INSERT INTO ats_scans (id, user_id, file_name, s3_key, score, report)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(scan_id)
    .bind(user.id)
    .bind(&file.file_name)
    .bind(&s3_key)
    .bind(score)
    .bind(&report_json)
    .fetch_one(&state.db)
    .await?;

    let updated = sqlx::query(
        "UPDATE resumes SET ats_score = $1, feedback = $2, updated_at = NOW() WHERE user_id = $3",
    )
    .bind(f64::from(report.score))
    .bind(report.suggestions.join("\n"))
    .bind(user.id)
    .execute(&state.db)
    .await?;
    if updated.rows_affected() == 0 {
        warn!("ATS scan {} stored for user {} with no saved resume", scan.id, user.id);
    }

    info!(
        "ATS scan {} for user {} scored {}",
        scan.id, user.id, report.score
    );
    Ok((
        StatusCode::CREATED,
        Json(AtsScanResponse {
            id: scan.id,
            file_name: scan.file_name,
            created_at: scan.created_at,
            report,
        }),
    ))
}

/// GET /api/ats/scans
pub async fn handle_list_ats_scans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<AtsScanRow>>, AppError> {
    let scans = sqlx::query_as::<_, AtsScanRow>(
        "SELECT * FROM ats_scans WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(scans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::test_user;

    #[test]
    fn test_improve_prompt_fills_placeholders() {
        let request = ImproveRequest {
            current: "  Worked on backend services  ".to_string(),
            section: "experience".to_string(),
        };
        let prompt = build_improve_prompt(&request, &test_user());
        assert!(prompt.contains("following experience section"));
        assert!(prompt.contains("CURRENT CONTENT:\nWorked on backend services\n"));
        assert!(prompt.contains("tech-software-development"));
        assert!(!prompt.contains("{current}"));
    }

    #[test]
    fn test_scan_response_flattens_report() {
        let response = AtsScanResponse {
            id: Uuid::nil(),
            file_name: "cv.txt".to_string(),
            created_at: Utc::now(),
            report: score_resume("Skills\nRust", None),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("score").is_some());
        assert!(json.get("breakdown").is_some());
        assert_eq!(json["file_name"], "cv.txt");
    }
}
