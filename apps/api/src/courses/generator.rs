//! Course generation: one LLM call for markdown, then the splitter.

use serde::Deserialize;
use tracing::info;

use crate::courses::parser::{parse_course_markdown, ParsedCourse};
use crate::courses::prompts::{COURSE_PROMPT_TEMPLATE, COURSE_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::profile_line;
use crate::llm_client::{strip_code_fences, LlmClient};
use crate::models::user::User;

const MAX_TOPIC_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub topic: String,
    pub level: Option<String>,
    pub description: Option<String>,
}

/// A validated course request.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSpec {
    pub topic: String,
    pub level: String,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct GeneratedCourse {
    pub raw_markdown: String,
    pub parsed: ParsedCourse,
}

pub fn validate_request(request: CreateCourseRequest) -> Result<CourseSpec, AppError> {
    let topic = request.topic.trim().to_string();
    if topic.is_empty() {
        return Err(AppError::Validation("topic cannot be empty".to_string()));
    }
    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(AppError::Validation(format!(
            "topic must be at most {MAX_TOPIC_CHARS} characters"
        )));
    }

    let level = match request.level.as_deref().map(|l| l.trim().to_lowercase()) {
        None => "beginner".to_string(),
        Some(l) if l.is_empty() => "beginner".to_string(),
        Some(l) if LEVELS.contains(&l.as_str()) => l,
        Some(l) => {
            return Err(AppError::Validation(format!(
                "level '{l}' must be one of: {}",
                LEVELS.join(", ")
            )))
        }
    };

    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(AppError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }

    Ok(CourseSpec {
        topic,
        level,
        description,
    })
}

pub fn build_course_prompt(spec: &CourseSpec, user: &User) -> String {
    COURSE_PROMPT_TEMPLATE
        .replace("{topic}", &spec.topic)
        .replace("{level}", &spec.level)
        .replace(
            "{description}",
            spec.description.as_deref().unwrap_or("none"),
        )
        .replace(
            "{profile}",
            &profile_line(user.industry.as_deref(), &user.skills),
        )
}

pub async fn generate_course(
    llm: &LlmClient,
    spec: &CourseSpec,
    user: &User,
) -> Result<GeneratedCourse, AppError> {
    let prompt = build_course_prompt(spec, user);
    let text = llm
        .call_text(&prompt, COURSE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Course generation failed: {e}")))?;

    let raw_markdown = strip_code_fences(&text).to_string();
    let parsed = parse_course_markdown(&raw_markdown, &spec.topic);
    info!(
        "Generated course '{}' with {} chapters for user {}",
        parsed.title,
        parsed.chapters.len(),
        user.id
    );

    Ok(GeneratedCourse {
        raw_markdown,
        parsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::test_user;

    fn request(topic: &str, level: Option<&str>) -> CreateCourseRequest {
        CreateCourseRequest {
            topic: topic.to_string(),
            level: level.map(String::from),
            description: None,
        }
    }

    #[test]
    fn test_level_defaults_to_beginner() {
        let spec = validate_request(request("  System Design ", None)).unwrap();
        assert_eq!(spec.topic, "System Design");
        assert_eq!(spec.level, "beginner");
    }

    #[test]
    fn test_level_is_normalized() {
        let spec = validate_request(request("SQL", Some("Advanced"))).unwrap();
        assert_eq!(spec.level, "advanced");
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(matches!(
            validate_request(request("SQL", Some("expert"))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_topic_rejected() {
        assert!(matches!(
            validate_request(request("   ", None)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_prompt_includes_topic_level_and_profile() {
        let spec = validate_request(CreateCourseRequest {
            topic: "Kubernetes".to_string(),
            level: Some("intermediate".to_string()),
            description: Some("Focus on deployments".to_string()),
        })
        .unwrap();
        let prompt = build_course_prompt(&spec, &test_user());
        assert!(prompt.contains("TOPIC: Kubernetes"));
        assert!(prompt.contains("LEVEL: intermediate"));
        assert!(prompt.contains("Focus on deployments"));
        assert!(prompt.contains("Rust, PostgreSQL"));
        assert!(!prompt.contains("{topic}"));
    }
}
