//! ATS scorer: deterministic, no LLM call.
//!
//! score (0-100) = sections (30) + keywords (40) + impact (20) + formatting (10)
//!
//! - sections: 6 points each for contact details, summary, experience,
//!   education and skills
//! - keywords: share of the job description's top keywords found in the resume
//! - impact: share of bullet lines carrying a quantified result
//! - formatting: word count in the range recruiters expect

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::resumes::impact::{check_bullet, extract_bullets, BulletIssue};

const SECTION_POINTS: u32 = 6;
const KEYWORD_POINTS: f64 = 40.0;
const IMPACT_POINTS: f64 = 20.0;
const FORMAT_POINTS: u32 = 10;
const MAX_KEYWORDS: usize = 25;
const MAX_SUGGESTED_KEYWORDS: usize = 5;
const MAX_BULLET_ISSUES: usize = 3;
const MAX_HEADING_WORDS: usize = 4;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "our", "are", "will", "this", "that", "from",
    "have", "has", "who", "what", "their", "they", "them", "about", "into", "able", "must",
    "should", "would", "can", "all", "any", "not", "but", "was", "were", "been", "being", "its",
    "also", "more", "most", "other", "such", "than", "then", "there", "these", "those", "work",
    "working", "role", "team", "teams", "job", "year", "years", "including", "etc", "per",
    "across", "within", "using", "use", "well", "new", "strong", "ability", "experience",
    "plus", "preferred", "required", "requirements", "responsibilities", "candidate",
    "join", "looking", "we", "us", "how", "why", "when", "where", "which", "while",
];

/// Used when no job description is supplied.
const DEFAULT_KEYWORDS: &[&str] = &[
    "led",
    "managed",
    "developed",
    "delivered",
    "designed",
    "implemented",
    "improved",
    "collaborated",
    "analysis",
    "communication",
    "leadership",
    "results",
];

struct SectionRule {
    name: &'static str,
    headings: &'static [&'static str],
}

const SECTION_RULES: &[SectionRule] = &[
    SectionRule {
        name: "summary",
        headings: &["summary", "profile", "objective", "about me", "about"],
    },
    SectionRule {
        name: "experience",
        headings: &["experience", "employment", "work history", "professional history"],
    },
    SectionRule {
        name: "education",
        headings: &["education", "academic", "qualifications"],
    },
    SectionRule {
        name: "skills",
        headings: &["skills", "technologies", "technical skills", "competencies"],
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub sections: u32,
    pub keywords: u32,
    pub impact: u32,
    pub formatting: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsReport {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub missing_sections: Vec<String>,
    pub word_count: usize,
    pub bullet_count: usize,
    pub quantified_bullets: usize,
    pub suggestions: Vec<String>,
}

/// Scores resume text, optionally against a job description.
pub fn score_resume(resume_text: &str, job_description: Option<&str>) -> AtsReport {
    let mut suggestions = Vec::new();

    // Sections
    let missing_sections = find_missing_sections(resume_text);
    let present = SECTION_RULES.len() + 1 - missing_sections.len();
    let sections = SECTION_POINTS * present as u32;
    for section in &missing_sections {
        suggestions.push(format!("Add a clearly labelled '{section}' section"));
    }

    // Keywords
    let keywords = match job_description.map(str::trim).filter(|jd| !jd.is_empty()) {
        Some(jd) => extract_keywords(jd, MAX_KEYWORDS),
        None => DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
    };
    let resume_tokens: HashSet<String> = tokenize(resume_text).collect();
    let (matched_keywords, missing_keywords): (Vec<String>, Vec<String>) = keywords
        .into_iter()
        .partition(|k| resume_tokens.contains(k));
    let keyword_total = matched_keywords.len() + missing_keywords.len();
    let keyword_score = if keyword_total == 0 {
        KEYWORD_POINTS
    } else {
        KEYWORD_POINTS * matched_keywords.len() as f64 / keyword_total as f64
    };
    if !missing_keywords.is_empty() {
        let top: Vec<&str> = missing_keywords
            .iter()
            .take(MAX_SUGGESTED_KEYWORDS)
            .map(String::as_str)
            .collect();
        suggestions.push(format!(
            "Work these keywords into your experience where accurate: {}",
            top.join(", ")
        ));
    }

    // Impact
    let bullets = extract_bullets(resume_text);
    let issues: Vec<BulletIssue> = bullets.iter().filter_map(|b| check_bullet(b)).collect();
    let quantified_bullets = bullets.len() - issues.len();
    let impact_score = if bullets.is_empty() {
        suggestions.push("Describe your experience with bullet points".to_string());
        0.0
    } else {
        IMPACT_POINTS * quantified_bullets as f64 / bullets.len() as f64
    };
    for issue in issues.iter().take(MAX_BULLET_ISSUES) {
        suggestions.push(format!("\"{}\": {}", issue.bullet, issue.suggestion));
    }

    // Formatting
    let word_count = resume_text.split_whitespace().count();
    let formatting = formatting_points(word_count);
    if formatting < FORMAT_POINTS {
        suggestions.push(format!(
            "Your resume has {word_count} words; aim for 300 to 1000"
        ));
    }

    let breakdown = ScoreBreakdown {
        sections,
        keywords: keyword_score.round() as u32,
        impact: impact_score.round() as u32,
        formatting,
    };
    let score = (breakdown.sections + breakdown.keywords + breakdown.impact + breakdown.formatting)
        .min(100);

    AtsReport {
        score,
        breakdown,
        matched_keywords,
        missing_keywords,
        missing_sections,
        word_count,
        bullet_count: bullets.len(),
        quantified_bullets,
        suggestions,
    }
}

/// Most frequent meaningful terms of `text`, ties broken by first appearance.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in tokenize(text).enumerate() {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }
    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
    ranked.into_iter().take(limit).map(|(k, _)| k).collect()
}

/// Lowercased terms of at least 3 characters, minus stopwords.
/// `+` and `#` stay inside a term so "c++" survives.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .map(|t| t.trim_start_matches(|c: char| c == '+' || c == '#').to_lowercase())
        .filter(|t| t.chars().count() >= 3)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

/// Lowercased heading text when `line` is formatted as a heading: a markdown
/// `#` line, a line ending in `:`, or an all-caps line.
fn heading_text(line: &str) -> Option<String> {
    let line = line.trim();
    let markdown = line.starts_with('#');
    let labelled = line.ends_with(':');
    let mut letters = line.chars().filter(|c| c.is_alphabetic()).peekable();
    let all_caps = letters.peek().is_some() && letters.all(char::is_uppercase);
    if !(markdown || labelled || all_caps) {
        return None;
    }

    let text = line
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase();
    (!text.is_empty() && text.split_whitespace().count() <= MAX_HEADING_WORDS).then_some(text)
}

/// The heading is the label itself, optionally qualified ("Work Experience",
/// "Skills & Tools").
fn heading_matches(heading: &str, label: &str) -> bool {
    heading == label
        || heading.starts_with(&format!("{label} "))
        || heading.ends_with(&format!(" {label}"))
}

fn find_missing_sections(text: &str) -> Vec<String> {
    let headings: Vec<String> = text.lines().filter_map(heading_text).collect();

    let mut missing = Vec::new();
    if !has_contact_details(text) {
        missing.push("contact".to_string());
    }
    for rule in SECTION_RULES {
        let found = headings
            .iter()
            .any(|h| rule.headings.iter().any(|label| heading_matches(h, label)));
        if !found {
            missing.push(rule.name.to_string());
        }
    }
    missing
}

fn has_contact_details(text: &str) -> bool {
    let has_email = text.split_whitespace().any(|w| {
        let w = w.trim_matches(|c: char| !c.is_alphanumeric());
        match w.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        }
    });
    let has_phone = text
        .lines()
        .any(|l| l.chars().filter(|c| c.is_ascii_digit()).count() >= 10);
    has_email || has_phone
}

fn formatting_points(word_count: usize) -> u32 {
    match word_count {
        300..=1000 => FORMAT_POINTS,
        150..=1500 => FORMAT_POINTS / 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "Senior Backend Engineer. We need Rust and PostgreSQL expertise. \
        You will build Rust services on Kubernetes, tune PostgreSQL queries, and \
        own observability with Prometheus. Rust experience required.";

    fn resume(word_padding: usize) -> String {
        let mut text = String::from(
            "Ada Lovelace\nada@example.com | +44 20 7946 0958\n\n\
             ## Summary\nBackend engineer focused on Rust services.\n\n\
             ## Experience\n\
             - Built Rust services on Kubernetes handling 12k requests per second\n\
             - Cut PostgreSQL query latency by 45%\n\
             - Improved the deployment process\n\n\
             ## Education\nBSc Computer Science\n\n\
             ## Skills\nRust, PostgreSQL, Kubernetes, Docker\n",
        );
        for _ in 0..word_padding {
            text.push_str(" detail");
        }
        text
    }

    #[test]
    fn test_extract_keywords_ranks_by_frequency() {
        let keywords = extract_keywords(JD, 3);
        assert_eq!(keywords, vec!["rust", "postgresql", "senior"]);
    }

    #[test]
    fn test_tokenize_keeps_language_symbols() {
        let tokens: Vec<String> = tokenize("C++ and C# plus Go, F#-ish 2024").collect();
        assert_eq!(tokens, vec!["c++", "ish", "2024"]);
    }

    #[test]
    fn test_complete_resume_scores_well() {
        let report = score_resume(&resume(320), Some(JD));
        assert!(report.missing_sections.is_empty(), "{:?}", report.missing_sections);
        assert_eq!(report.breakdown.sections, 30);
        assert_eq!(report.breakdown.formatting, 10);
        assert_eq!(report.bullet_count, 3);
        assert_eq!(report.quantified_bullets, 2);
        assert_eq!(report.breakdown.impact, 13);
        assert!(report.matched_keywords.contains(&"rust".to_string()));
        assert!(report.missing_keywords.contains(&"prometheus".to_string()));
        assert!(report.score >= 60, "score was {}", report.score);
        assert!(report.score <= 100);
    }

    #[test]
    fn test_missing_sections_reported() {
        let report = score_resume("Just a paragraph without any structure at all.", None);
        assert_eq!(
            report.missing_sections,
            vec!["contact", "summary", "experience", "education", "skills"]
        );
        assert_eq!(report.breakdown.sections, 0);
        assert_eq!(report.breakdown.impact, 0);
        assert_eq!(report.breakdown.formatting, 0);
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("bullet points")));
    }

    #[test]
    fn test_no_job_description_uses_default_keywords() {
        let report = score_resume("Led and delivered projects. Managed results.", None);
        assert!(report.matched_keywords.contains(&"led".to_string()));
        assert!(report.matched_keywords.contains(&"delivered".to_string()));
        assert_eq!(
            report.matched_keywords.len() + report.missing_keywords.len(),
            DEFAULT_KEYWORDS.len()
        );
    }

    #[test]
    fn test_vague_bullet_suggestion() {
        let report = score_resume(&resume(0), Some(JD));
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("Improved the deployment process")));
    }

    #[test]
    fn test_formatting_points_bands() {
        assert_eq!(formatting_points(100), 0);
        assert_eq!(formatting_points(200), 5);
        assert_eq!(formatting_points(650), 10);
        assert_eq!(formatting_points(1200), 5);
        assert_eq!(formatting_points(5000), 0);
    }

    #[test]
    fn test_sentences_do_not_count_as_headings() {
        let report = score_resume(
            "ada@example.com\nI have ten years experience.\nSkilled in skills talk.\n\
             About my academic life.\nMy profile is short.",
            None,
        );
        assert_eq!(
            report.missing_sections,
            vec!["summary", "experience", "education", "skills"]
        );
        assert_eq!(report.breakdown.sections, 6);
    }

    #[test]
    fn test_heading_styles_are_recognised() {
        let text = "ada@example.com\nPROFESSIONAL SUMMARY\nWork Experience:\n\
                    # Education\nTECHNICAL SKILLS";
        let report = score_resume(text, None);
        assert!(report.missing_sections.is_empty(), "{:?}", report.missing_sections);
        assert_eq!(report.breakdown.sections, 30);
    }

    #[test]
    fn test_heading_text_requires_heading_format() {
        assert_eq!(heading_text("## Experience"), Some("experience".to_string()));
        assert_eq!(heading_text("Skills:"), Some("skills".to_string()));
        assert_eq!(heading_text("I have experience"), None);
        assert_eq!(heading_text("## My many years of broad experience"), None);
        assert!(!heading_matches("experiences", "experience"));
    }

    #[test]
    fn test_contact_detection() {
        assert!(has_contact_details("reach me: (ada@example.com)"));
        assert!(has_contact_details("Phone: 555-123-4567"));
        assert!(!has_contact_details("@handle and 123"));
    }
}
