//! Bullet-level impact checks used by the ATS scorer.
//!
//! A bullet counts as quantified when it carries a number, percentage,
//! currency amount or multiplier. Vague verbs and scale words are reported
//! only for bullets that are not quantified.

use serde::Serialize;

const VAGUE_VERBS: &[&str] = &[
    "improved",
    "enhanced",
    "helped",
    "worked on",
    "assisted",
    "supported",
    "participated",
    "involved",
    "responsible for",
];

const VAGUE_SCALE_WORDS: &[&str] = &[
    "significant",
    "major",
    "large",
    "huge",
    "massive",
    "substantial",
    "considerable",
    "many",
    "numerous",
    "various",
    "several",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulletIssue {
    pub bullet: String,
    pub reason: String,
    pub suggestion: String,
}

pub fn is_quantified(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        || text.contains('%')
        || text.contains('$')
        || text.contains('€')
        || text.contains('£')
}

/// Returns the issue with a bullet, or `None` when it is quantified.
pub fn check_bullet(text: &str) -> Option<BulletIssue> {
    if is_quantified(text) {
        return None;
    }
    let lower = text.to_lowercase();

    if let Some(verb) = VAGUE_VERBS.iter().find(|v| lower.contains(**v)) {
        return Some(BulletIssue {
            bullet: text.to_string(),
            reason: format!("Vague verb '{verb}' without a measurable result"),
            suggestion: format!(
                "Replace '{verb}' with what changed and by how much, e.g. 'cut load time by 30%'"
            ),
        });
    }

    if let Some(word) = VAGUE_SCALE_WORDS.iter().find(|w| lower.contains(**w)) {
        return Some(BulletIssue {
            bullet: text.to_string(),
            reason: format!("Scale word '{word}' without a number"),
            suggestion: format!("Replace '{word}' with a specific figure such as '5x', '40%' or '12 clients'"),
        });
    }

    Some(BulletIssue {
        bullet: text.to_string(),
        reason: "No quantified outcome".to_string(),
        suggestion: "Add a number, percentage, amount or time saved".to_string(),
    })
}

/// Extracts bullet lines (`-`, `*`, `•`, or `1.` prefixed) with the marker removed.
pub fn extract_bullets(text: &str) -> Vec<&str> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let body = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| line.strip_prefix('•'))
                .or_else(|| strip_numbered(line))?;
            let body = body.trim();
            (!body.is_empty()).then_some(body)
        })
        .collect()
}

fn strip_numbered(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}
