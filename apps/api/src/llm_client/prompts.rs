// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Persona shared by every career-coaching prompt.
pub const COACH_PERSONA: &str = "You are an experienced career coach and technical \
    recruiter. You give concrete, honest, actionable guidance. You never invent \
    facts about the user.";

/// Describes the user profile in a single line for prompt context.
pub fn profile_line(industry: Option<&str>, skills: &[String]) -> String {
    let industry = industry.unwrap_or("an unspecified industry");
    if skills.is_empty() {
        format!("The user works in {industry}.")
    } else {
        format!(
            "The user works in {industry} with skills in: {}.",
            skills.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_line_with_skills() {
        let line = profile_line(Some("tech-software"), &["Rust".into(), "SQL".into()]);
        assert_eq!(
            line,
            "The user works in tech-software with skills in: Rust, SQL."
        );
    }

    #[test]
    fn test_profile_line_without_profile() {
        assert_eq!(
            profile_line(None, &[]),
            "The user works in an unspecified industry."
        );
    }
}
