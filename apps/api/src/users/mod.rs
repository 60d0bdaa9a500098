//! User profile and onboarding.

pub mod handlers;

use serde::Deserialize;

use crate::errors::AppError;

const MAX_EXPERIENCE_YEARS: i32 = 60;
const MAX_BIO_CHARS: usize = 1000;
const MAX_SKILLS: usize = 50;
const MAX_SKILL_CHARS: usize = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub industry: String,
    pub sub_industry: Option<String>,
    pub experience_years: i32,
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A validated onboarding submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub industry: String,
    pub experience_years: i32,
    pub bio: Option<String>,
    pub skills: Vec<String>,
}

/// `("Tech", Some("Software Development"))` → `tech-software-development`.
pub fn industry_slug(industry: &str, sub_industry: Option<&str>) -> String {
    let slugify = |s: &str| {
        s.split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    };
    match sub_industry.map(slugify).filter(|s| !s.is_empty()) {
        Some(sub) => format!("{}-{sub}", slugify(industry)),
        None => slugify(industry),
    }
}

/// Trims skills and drops blanks and case-insensitive duplicates, keeping order.
pub fn clean_skills(skills: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

pub fn validate_onboarding(request: &OnboardingRequest) -> Result<Profile, AppError> {
    if request.industry.trim().is_empty() {
        return Err(AppError::Validation("industry cannot be empty".to_string()));
    }
    if !(0..=MAX_EXPERIENCE_YEARS).contains(&request.experience_years) {
        return Err(AppError::Validation(format!(
            "experience_years must be between 0 and {MAX_EXPERIENCE_YEARS}"
        )));
    }

    let bio = request
        .bio
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string);
    if bio.as_ref().is_some_and(|b| b.chars().count() > MAX_BIO_CHARS) {
        return Err(AppError::Validation(format!(
            "bio must be at most {MAX_BIO_CHARS} characters"
        )));
    }

    let skills = clean_skills(&request.skills);
    if skills.len() > MAX_SKILLS {
        return Err(AppError::Validation(format!(
            "at most {MAX_SKILLS} skills are allowed"
        )));
    }
    if let Some(skill) = skills.iter().find(|s| s.chars().count() > MAX_SKILL_CHARS) {
        return Err(AppError::Validation(format!(
            "skill '{skill}' must be at most {MAX_SKILL_CHARS} characters"
        )));
    }

    Ok(Profile {
        industry: industry_slug(&request.industry, request.sub_industry.as_deref()),
        experience_years: request.experience_years,
        bio,
        skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OnboardingRequest {
        OnboardingRequest {
            industry: "Tech".to_string(),
            sub_industry: Some("Software  Development".to_string()),
            experience_years: 5,
            bio: Some("  ".to_string()),
            skills: vec![
                " Rust ".to_string(),
                "rust".to_string(),
                "".to_string(),
                "SQL".to_string(),
            ],
        }
    }

    #[test]
    fn test_industry_slug_with_sub_industry() {
        assert_eq!(
            industry_slug("Tech", Some("Software Development")),
            "tech-software-development"
        );
    }

    #[test]
    fn test_industry_slug_without_sub_industry() {
        assert_eq!(industry_slug(" Health Care ", None), "health-care");
        assert_eq!(industry_slug("Finance", Some("  ")), "finance");
    }

    #[test]
    fn test_validate_onboarding_normalizes() {
        let profile = validate_onboarding(&request()).unwrap();
        assert_eq!(profile.industry, "tech-software-development");
        assert_eq!(profile.bio, None);
        assert_eq!(profile.skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_validate_onboarding_rejects_bad_experience() {
        let mut req = request();
        req.experience_years = -1;
        assert!(matches!(validate_onboarding(&req), Err(AppError::Validation(_))));
        req.experience_years = 61;
        assert!(matches!(validate_onboarding(&req), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_onboarding_rejects_blank_industry() {
        let mut req = request();
        req.industry = "  ".to_string();
        assert!(matches!(validate_onboarding(&req), Err(AppError::Validation(_))));
    }
}
