//! Mock interviews: generated quizzes graded into assessments, and
//! LLM feedback on voice interview transcripts.

pub mod handlers;
pub mod prompts;
pub mod quiz;
pub mod voice;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStats {
    pub count: usize,
    pub average_score: f64,
    pub latest_score: Option<f64>,
}

/// `scores` ordered oldest first.
pub fn compute_stats(scores: &[f64]) -> AssessmentStats {
    let count = scores.len();
    let average_score = if count == 0 {
        0.0
    } else {
        let mean = scores.iter().sum::<f64>() / count as f64;
        (mean * 10.0).round() / 10.0
    };
    AssessmentStats {
        count,
        average_score,
        latest_score: scores.last().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.latest_score, None);
    }

    #[test]
    fn test_stats_average_and_latest() {
        let stats = compute_stats(&[60.0, 80.0, 90.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.average_score, 76.7);
        assert_eq!(stats.latest_score, Some(90.0));
    }
}
