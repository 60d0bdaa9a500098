//! Voice interview feedback.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interviews::prompts::VOICE_FEEDBACK_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{profile_line, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::user::User;

const MAX_ROLE_CHARS: usize = 200;
const MAX_TRANSCRIPT_CHARS: usize = 50_000;

#[derive(Debug, Deserialize)]
pub struct VoiceInterviewRequest {
    pub role: String,
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeedback {
    pub score: i32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub summary: String,
}

/// Feedback as the model returns it; scores may be fractional or out of range.
#[derive(Debug, Deserialize)]
struct RawVoiceFeedback {
    score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    summary: String,
}

impl From<RawVoiceFeedback> for VoiceFeedback {
    fn from(raw: RawVoiceFeedback) -> Self {
        let score = if raw.score.is_finite() {
            raw.score.round().clamp(0.0, 100.0) as i32
        } else {
            0
        };
        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        VoiceFeedback {
            score,
            strengths: clean(raw.strengths),
            improvements: clean(raw.improvements),
            summary: raw.summary.trim().to_string(),
        }
    }
}

/// Returns trimmed `(role, transcript)`.
pub fn validate_request(request: &VoiceInterviewRequest) -> Result<(String, String), AppError> {
    let role = request.role.trim();
    let transcript = request.transcript.trim();
    if role.is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if role.chars().count() > MAX_ROLE_CHARS {
        return Err(AppError::Validation(format!(
            "role must be at most {MAX_ROLE_CHARS} characters"
        )));
    }
    if transcript.is_empty() {
        return Err(AppError::Validation("transcript cannot be empty".to_string()));
    }
    if transcript.chars().count() > MAX_TRANSCRIPT_CHARS {
        return Err(AppError::Validation(format!(
            "transcript must be at most {MAX_TRANSCRIPT_CHARS} characters"
        )));
    }
    Ok((role.to_string(), transcript.to_string()))
}

pub async fn evaluate_transcript(
    llm: &LlmClient,
    role: &str,
    transcript: &str,
    user: &User,
) -> Result<VoiceFeedback, AppError> {
    let prompt = VOICE_FEEDBACK_PROMPT_TEMPLATE
        .replace("{role}", role)
        .replace(
            "{profile}",
            &profile_line(user.industry.as_deref(), &user.skills),
        )
        .replace("{transcript}", transcript);

    let raw: RawVoiceFeedback = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Interview evaluation failed: {e}")))?;
    Ok(raw.into())
}
