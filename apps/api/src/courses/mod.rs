// Courses: LLM-generated markdown courses split into chapters, with
// per-chapter completion tracking. Certificates are issued from here once
// progress reaches 100.

pub mod generator;
pub mod handlers;
pub mod parser;
pub mod prompts;

use crate::errors::AppError;

/// Marks `chapter_index` complete (or not) and returns the new sorted,
/// de-duplicated completion list.
pub fn update_completed_chapters(
    completed: &[i32],
    chapter_index: i32,
    chapter_count: i32,
    done: bool,
) -> Result<Vec<i32>, AppError> {
    if chapter_index < 0 || chapter_index >= chapter_count {
        return Err(AppError::Validation(format!(
            "chapter_index {chapter_index} is out of range (course has {chapter_count} chapters)"
        )));
    }

    let mut updated: Vec<i32> = completed
        .iter()
        .copied()
        .filter(|i| *i != chapter_index && (0..chapter_count).contains(i))
        .collect();
    if done {
        updated.push(chapter_index);
    }
    updated.sort_unstable();
    updated.dedup();
    Ok(updated)
}

/// Percentage of chapters completed, rounded to the nearest integer.
pub fn compute_progress(completed: usize, chapter_count: i32) -> i32 {
    if chapter_count <= 0 {
        return 0;
    }
    let pct = completed as f64 / chapter_count as f64 * 100.0;
    pct.round().clamp(0.0, 100.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_chapter_complete() {
        let updated = update_completed_chapters(&[0, 2], 1, 4, true).unwrap();
        assert_eq!(updated, vec![0, 1, 2]);
    }

    #[test]
    fn test_marking_twice_does_not_duplicate() {
        let updated = update_completed_chapters(&[1], 1, 4, true).unwrap();
        assert_eq!(updated, vec![1]);
    }

    #[test]
    fn test_unmark_chapter() {
        let updated = update_completed_chapters(&[0, 1, 2], 1, 4, false).unwrap();
        assert_eq!(updated, vec![0, 2]);
    }

    #[test]
    fn test_out_of_range_chapter_rejected() {
        assert!(matches!(
            update_completed_chapters(&[], 4, 4, true),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update_completed_chapters(&[], -1, 4, true),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(compute_progress(0, 3), 0);
        assert_eq!(compute_progress(1, 3), 33);
        assert_eq!(compute_progress(2, 3), 67);
        assert_eq!(compute_progress(3, 3), 100);
        assert_eq!(compute_progress(0, 0), 0);
    }
}
