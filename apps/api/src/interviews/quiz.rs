//! Quiz generation and grading.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interviews::prompts::{QUIZ_PROMPT_TEMPLATE, TIP_PROMPT_TEMPLATE};
use crate::llm_client::prompts::{profile_line, COACH_PERSONA, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::user::User;

pub const QUESTION_COUNT: usize = 10;
pub const DEFAULT_CATEGORY: &str = "Technical";
const MAX_CATEGORY_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuiz {
    questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct GradedQuiz {
    pub questions: Vec<GradedQuestion>,
    /// `correct / total * 100`.
    pub score: f64,
}

impl GradedQuiz {
    pub fn wrong_answers(&self) -> impl Iterator<Item = &GradedQuestion> {
        self.questions.iter().filter(|q| !q.is_correct)
    }
}

pub fn normalize_category(category: Option<&str>) -> Result<String, AppError> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    match category {
        None => Ok(DEFAULT_CATEGORY.to_string()),
        Some(c) if c.chars().count() > MAX_CATEGORY_CHARS => Err(AppError::Validation(format!(
            "category must be at most {MAX_CATEGORY_CHARS} characters"
        ))),
        Some(c) => Ok(c.to_string()),
    }
}

/// Keeps questions with at least two options whose correct answer is one of them.
fn well_formed(questions: Vec<QuizQuestion>) -> Vec<QuizQuestion> {
    questions
        .into_iter()
        .filter(|q| {
            !q.question.trim().is_empty()
                && q.options.len() >= 2
                && q.options.iter().any(|o| o == &q.correct_answer)
        })
        .take(QUESTION_COUNT)
        .collect()
}

pub fn build_quiz_prompt(category: &str, user: &User) -> String {
    QUIZ_PROMPT_TEMPLATE
        .replace("{count}", &QUESTION_COUNT.to_string())
        .replace("{category}", category)
        .replace(
            "{profile}",
            &profile_line(user.industry.as_deref(), &user.skills),
        )
}

pub async fn generate_quiz(
    llm: &LlmClient,
    category: &str,
    user: &User,
) -> Result<Vec<QuizQuestion>, AppError> {
    let prompt = build_quiz_prompt(category, user);
    let generated: GeneratedQuiz = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Quiz generation failed: {e}")))?;

    let received = generated.questions.len();
    let questions = well_formed(generated.questions);
    if questions.is_empty() {
        return Err(AppError::Llm(
            "Quiz generation returned no usable questions".to_string(),
        ));
    }
    if questions.len() < received {
        warn!(
            "Dropped {} malformed quiz questions for user {}",
            received - questions.len(),
            user.id
        );
    }
    info!(
        "Generated {} {category} questions for user {}",
        questions.len(),
        user.id
    );
    Ok(questions)
}

/// Grades `answers` against `questions` position by position.
pub fn grade(questions: Vec<QuizQuestion>, answers: &[String]) -> Result<GradedQuiz, AppError> {
    if questions.is_empty() {
        return Err(AppError::Validation("questions cannot be empty".to_string()));
    }
    if questions.len() != answers.len() {
        return Err(AppError::Validation(format!(
            "expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }

    let graded: Vec<GradedQuestion> = questions
        .into_iter()
        .zip(answers)
        .map(|(q, answer)| {
            let user_answer = answer.trim().to_string();
            GradedQuestion {
                is_correct: user_answer == q.correct_answer.trim(),
                question: q.question,
                options: q.options,
                correct_answer: q.correct_answer,
                user_answer,
                explanation: q.explanation,
            }
        })
        .collect();

    let correct = graded.iter().filter(|q| q.is_correct).count();
    let score = correct as f64 / graded.len() as f64 * 100.0;

    Ok(GradedQuiz {
        questions: graded,
        score,
    })
}

pub fn build_tip_prompt(category: &str, quiz: &GradedQuiz, user: &User) -> String {
    let wrong_answers = quiz
        .wrong_answers()
        .map(|q| {
            format!(
                "Question: \"{}\"\nCorrect answer: \"{}\"\nUser answer: \"{}\"",
                q.question, q.correct_answer, q.user_answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    TIP_PROMPT_TEMPLATE
        .replace("{category}", category)
        .replace(
            "{profile}",
            &profile_line(user.industry.as_deref(), &user.skills),
        )
        .replace("{wrong_answers}", &wrong_answers)
}

/// Asks for a study tip when anything was answered wrong. A failed call is
/// logged and yields no tip; the assessment is saved either way.
pub async fn improvement_tip(
    llm: &LlmClient,
    category: &str,
    quiz: &GradedQuiz,
    user: &User,
) -> Option<String> {
    quiz.wrong_answers().next()?;

    let prompt = build_tip_prompt(category, quiz, user);
    match llm.call_text(&prompt, COACH_PERSONA).await {
        Ok(tip) => Some(tip),
        Err(e) => {
            warn!("Improvement tip generation failed for user {}: {e}", user.id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::test_user;

    fn question(text: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            question: text.to_string(),
            options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            correct_answer: correct.to_string(),
            explanation: String::new(),
        }
    }

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_grade_scores_percentage() {
        let questions = vec![
            question("q1", "A"),
            question("q2", "B"),
            question("q3", "C"),
            question("q4", "A"),
        ];
        let quiz = grade(questions, &answers(&["A", "B", "A", " A "])).unwrap();
        assert_eq!(quiz.score, 75.0);
        let wrong: Vec<&str> = quiz.wrong_answers().map(|q| q.question.as_str()).collect();
        assert_eq!(wrong, vec!["q3"]);
        assert_eq!(quiz.questions[3].user_answer, "A");
    }

    #[test]
    fn test_grade_all_correct_has_no_wrong_answers() {
        let quiz = grade(vec![question("q1", "B")], &answers(&["B"])).unwrap();
        assert_eq!(quiz.score, 100.0);
        assert_eq!(quiz.wrong_answers().count(), 0);
    }

    #[test]
    fn test_grade_length_mismatch_rejected() {
        let result = grade(vec![question("q1", "A")], &answers(&["A", "B"]));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_grade_empty_rejected() {
        assert!(matches!(grade(vec![], &[]), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_well_formed_drops_bad_questions() {
        let mut missing_answer = question("q2", "Z");
        missing_answer.options.truncate(2);
        let mut single_option = question("q3", "A");
        single_option.options.truncate(1);
        let kept = well_formed(vec![question("q1", "A"), missing_answer, single_option]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].question, "q1");
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(None).unwrap(), "Technical");
        assert_eq!(normalize_category(Some("  ")).unwrap(), "Technical");
        assert_eq!(normalize_category(Some(" Behavioral ")).unwrap(), "Behavioral");
        let long = "x".repeat(MAX_CATEGORY_CHARS + 1);
        assert!(normalize_category(Some(&long)).is_err());
    }

    #[test]
    fn test_tip_prompt_lists_wrong_answers_only() {
        let quiz = grade(
            vec![question("What is ownership?", "A"), question("What is a trait?", "B")],
            &answers(&["C", "B"]),
        )
        .unwrap();
        let prompt = build_tip_prompt("Technical", &quiz, &test_user());
        assert!(prompt.contains("What is ownership?"));
        assert!(prompt.contains("User answer: \"C\""));
        assert!(!prompt.contains("What is a trait?"));
    }

    #[test]
    fn test_quiz_prompt_requests_count() {
        let prompt = build_quiz_prompt("Technical", &test_user());
        assert!(prompt.starts_with("Generate 10 Technical interview questions"));
    }

    #[test]
    fn test_generated_quiz_deserializes_without_explanation() {
        let json = r#"{"questions":[{"question":"q","options":["A","B"],"correct_answer":"A"}]}"#;
        let quiz: GeneratedQuiz = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.questions[0].explanation, "");
    }
}
