//! Text extraction for uploaded resumes.

use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const MAX_FILE_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    PlainText,
}

impl ResumeFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::PlainText => "text/plain",
        }
    }
}

/// Content type wins over the file extension; anything else is rejected.
pub fn detect_format(file_name: &str, content_type: Option<&str>) -> Result<ResumeFormat, AppError> {
    match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
        Some("application/pdf") => return Ok(ResumeFormat::Pdf),
        Some("text/plain") | Some("text/markdown") => return Ok(ResumeFormat::PlainText),
        _ => {}
    }
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => Ok(ResumeFormat::Pdf),
        Some("txt") | Some("md") => Ok(ResumeFormat::PlainText),
        _ => Err(AppError::UnprocessableEntity(format!(
            "Unsupported resume file '{file_name}': upload a PDF or plain text file"
        ))),
    }
}

/// Extracts text, failing with 422 when nothing readable comes out.
pub async fn extract_text(data: Bytes, format: ResumeFormat) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::UnprocessableEntity("Uploaded file is empty".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Resume must be at most {} MiB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    let text = match format {
        ResumeFormat::PlainText => String::from_utf8(data.to_vec()).map_err(|_| {
            AppError::UnprocessableEntity("Text resume is not valid UTF-8".to_string())
        })?,
        ResumeFormat::Pdf => {
            // pdf-extract can panic on malformed input; the join error catches it.
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
                .await
                .map_err(|e| {
                    warn!("PDF extraction task failed: {e}");
                    AppError::UnprocessableEntity("Could not read the PDF".to_string())
                })?
                .map_err(|e| {
                    warn!("PDF extraction failed: {e}");
                    AppError::UnprocessableEntity("Could not read the PDF".to_string())
                })?
        }
    };

    let text = normalize_whitespace(&text);
    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume".to_string(),
        ));
    }
    Ok(text)
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
fn normalize_whitespace(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

pub fn upload_key(user_id: Uuid, scan_id: Uuid, file_name: &str) -> String {
    format!("ats/{user_id}/{scan_id}/{}", sanitize_file_name(file_name))
}
