use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssessmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    /// Graded questions with the user's answers.
    pub questions: Value,
    pub quiz_score: f64,
    pub improvement_tip: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VoiceInterviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub transcript: String,
    pub score: i32,
    pub feedback: Value,
    pub created_at: DateTime<Utc>,
}
