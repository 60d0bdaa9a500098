use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::certificates::{certificate_number, ensure_course_complete, normalize_number};
use crate::courses::handlers::find_owned_course;
use crate::errors::AppError;
use crate::models::course::CertificateRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IssueCertificateRequest {
    pub course_id: Uuid,
}

/// Public view returned by the verify endpoint.
#[derive(Debug, Serialize)]
pub struct CertificateVerification {
    pub certificate_number: String,
    pub recipient_name: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

async fn find_for_course(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<CertificateRow>, AppError> {
    Ok(sqlx::query_as::<_, CertificateRow>(
        "SELECT * FROM certificates WHERE user_id = $1 AND course_id = $2",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?)
}

/// POST /api/certificates
///
/// 201 with a new certificate, or 200 with the one already issued for the course.
pub async fn handle_issue_certificate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<IssueCertificateRequest>,
) -> Result<(StatusCode, Json<CertificateRow>), AppError> {
    let course = find_owned_course(&state.db, request.course_id, user.id).await?;
    ensure_course_complete(&course)?;

    if let Some(existing) = find_for_course(&state.db, user.id, course.id).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let issued_at = Utc::now();
    let number = certificate_number(issued_at, Uuid::new_v4());

    let inserted = sqlx::query_as::<_, CertificateRow>(
        r#"
        INSERT INTO certificates
            (id, user_id, course_id, certificate_number, course_title, recipient_name, issued_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, course_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(course.id)
    .bind(&number)
    .bind(&course.title)
    .bind(user.display_name())
    .bind(issued_at)
    .fetch_optional(&state.db)
    .await?;

    match inserted {
        Some(certificate) => {
            info!(
                "Issued certificate {} to user {} for course {}",
                certificate.certificate_number, user.id, course.id
            );
            Ok((StatusCode::CREATED, Json(certificate)))
        }
        // A concurrent request issued it between the lookup and the insert.
        None => find_for_course(&state.db, user.id, course.id)
            .await?
            .map(|existing| (StatusCode::OK, Json(existing)))
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Certificate insert conflicted but no row exists for course {}",
                    course.id
                ))
            }),
    }
}

/// GET /api/certificates
pub async fn handle_list_certificates(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CertificateRow>>, AppError> {
    let certificates = sqlx::query_as::<_, CertificateRow>(
        "SELECT * FROM certificates WHERE user_id = $1 ORDER BY issued_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(certificates))
}

/// GET /api/certificates/:id
pub async fn handle_get_certificate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(certificate_id): Path<Uuid>,
) -> Result<Json<CertificateRow>, AppError> {
    sqlx::query_as::<_, CertificateRow>(
        "SELECT * FROM certificates WHERE id = $1 AND user_id = $2",
    )
    .bind(certificate_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Certificate {certificate_id} not found")))
}

/// GET /api/certificates/verify/:number
///
/// Unauthenticated: anyone holding a certificate number can confirm it.
pub async fn handle_verify_certificate(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<CertificateVerification>, AppError> {
    let number = normalize_number(&number);
    let certificate = sqlx::query_as::<_, CertificateRow>(
        "SELECT * FROM certificates WHERE certificate_number = $1",
    )
    .bind(&number)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Certificate {number} not found")))?;

    Ok(Json(CertificateVerification {
        certificate_number: certificate.certificate_number,
        recipient_name: certificate.recipient_name,
        course_title: certificate.course_title,
        issued_at: certificate.issued_at,
    }))
}
