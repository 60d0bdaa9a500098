pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::certificates::handlers as certificates;
use crate::courses::handlers as courses;
use crate::insights::handlers as insights;
use crate::interviews::handlers as interviews;
use crate::rate_limit::enforce_rate_limit;
use crate::resumes::extract::MAX_UPLOAD_BYTES;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::streak::handlers as streak;
use crate::users::handlers as users;

/// Room for the multipart framing and the job description around the file.
const ATS_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 256 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Applied per method so only the LLM-backed endpoints are counted.
    let limited = middleware::from_fn_with_state(state.rate_limiter.clone(), enforce_rate_limit);

    Router::new()
        .route("/health", get(health::health_handler))
        // Users
        .route("/api/users/me", get(users::handle_get_me))
        .route("/api/users/sync", post(users::handle_sync_user))
        .route("/api/users/onboarding", post(users::handle_onboarding))
        // Streak
        .route(
            "/api/streak",
            get(streak::handle_get_streak).post(streak::handle_record_streak),
        )
        // Resume + ATS
        .route(
            "/api/resume",
            get(resumes::handle_get_resume)
                .put(resumes::handle_save_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/resume/improve",
            post(resumes::handle_improve_resume).route_layer(limited.clone()),
        )
        .route(
            "/api/ats/scan",
            post(resumes::handle_ats_scan)
                .layer(DefaultBodyLimit::max(ATS_BODY_LIMIT))
                .route_layer(limited.clone()),
        )
        .route("/api/ats/scans", get(resumes::handle_list_ats_scans))
        // Courses
        .route(
            "/api/courses",
            post(courses::handle_create_course)
                .route_layer(limited.clone())
                .get(courses::handle_list_courses),
        )
        .route(
            "/api/courses/:id",
            get(courses::handle_get_course).delete(courses::handle_delete_course),
        )
        .route(
            "/api/courses/:id/progress",
            patch(courses::handle_update_progress),
        )
        // Certificates
        .route(
            "/api/certificates",
            get(certificates::handle_list_certificates)
                .post(certificates::handle_issue_certificate),
        )
        .route(
            "/api/certificates/:id",
            get(certificates::handle_get_certificate),
        )
        .route(
            "/api/certificates/verify/:number",
            get(certificates::handle_verify_certificate),
        )
        // Interviews
        .route(
            "/api/interviews/quiz",
            post(interviews::handle_generate_quiz).route_layer(limited.clone()),
        )
        .route(
            "/api/interviews/assessments",
            get(interviews::handle_list_assessments).post(interviews::handle_save_assessment),
        )
        .route(
            "/api/interviews/stats",
            get(interviews::handle_assessment_stats),
        )
        .route(
            "/api/interviews/voice",
            post(interviews::handle_create_voice_interview)
                .route_layer(limited)
                .get(interviews::handle_list_voice_interviews),
        )
        .route(
            "/api/interviews/voice/:id",
            get(interviews::handle_get_voice_interview)
                .delete(interviews::handle_delete_voice_interview),
        )
        // Insights
        .route("/api/insights", get(insights::handle_get_insights))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::REMAINING_HEADER;
    use crate::state::test_support::test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "coach-api");
    }

    #[tokio::test]
    async fn test_protected_route_requires_identity() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/api/courses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        // Listing is not rate limited.
        assert!(!response.headers().contains_key(REMAINING_HEADER));
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_sync_requires_identity() {
        let app = build_router(test_state());
        let request = Request::post("/api/users/sync")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"ada@example.com"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_llm_routes_are_rate_limited() {
        // test_state allows 2 requests per window.
        let app = build_router(test_state());
        let request = || {
            Request::post("/api/courses")
                .header("x-forwarded-for", "203.0.113.7")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"topic":"Rust"}"#))
                .unwrap()
        };

        for _ in 0..2 {
            let response = app.clone().oneshot(request()).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert!(!response.headers().contains_key(REMAINING_HEADER));
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "RATE_LIMITED");

        // The listing endpoint on the same path is not counted.
        let response = app
            .oneshot(
                Request::get("/api/courses")
                    .header("x-forwarded-for", "203.0.113.7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
