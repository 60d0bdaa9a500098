//! Course completion certificates.
//!
//! One certificate per (user, course). Numbers look like `CC-20240301-9F86D081`
//! and are the public handle used by the verify endpoint.

pub mod handlers;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::course::CourseRow;

pub const NUMBER_PREFIX: &str = "CC";

pub fn certificate_number(issued_at: DateTime<Utc>, nonce: Uuid) -> String {
    let hex = nonce.simple().to_string().to_uppercase();
    format!(
        "{NUMBER_PREFIX}-{}-{}",
        issued_at.format("%Y%m%d"),
        &hex[..8]
    )
}

/// A certificate can only be issued for a fully completed course.
pub fn ensure_course_complete(course: &CourseRow) -> Result<(), AppError> {
    if course.progress < 100 || course.completed_at.is_none() {
        return Err(AppError::CourseIncomplete(format!(
            "Course '{}' is {}% complete",
            course.title, course.progress
        )));
    }
    Ok(())
}

/// Certificate numbers are matched case-insensitively.
pub fn normalize_number(number: &str) -> String {
    number.trim().to_uppercase()
}
