use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub clerk_user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_onboarded(&self) -> bool {
        self.industry.is_some()
    }

    /// Name printed on certificates; falls back to the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
pub(crate) fn test_user() -> User {
    User {
        id: Uuid::new_v4(),
        clerk_user_id: "user_test".to_string(),
        email: "ada@example.com".to_string(),
        name: Some("Ada Lovelace".to_string()),
        industry: Some("tech-software-development".to_string()),
        experience_years: Some(5),
        bio: None,
        skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
        current_streak: 0,
        longest_streak: 0,
        last_active_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
