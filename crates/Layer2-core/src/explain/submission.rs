//! Submission - 전송 텍스트 준비 (잘라내기 + 지문)

use lens_foundation::{fingerprint, FileRecord, Truncation, UNKNOWN_LANGUAGE};
use lens_service::ExplanationRequest;

/// What is actually sent for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Fingerprint of `request.code`
    pub fingerprint: String,
    pub truncation: Option<Truncation>,
    pub request: ExplanationRequest,
}

/// Longest prefix of at most `max_chars` characters
pub fn truncate(text: &str, max_chars: usize) -> (&str, Option<Truncation>) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let original_chars = max_chars + text[cut..].chars().count();
            (
                &text[..cut],
                Some(Truncation {
                    original_chars,
                    submitted_chars: max_chars,
                }),
            )
        }
        None => (text, None),
    }
}

/// Build the submission for a file; `None` when the file has no content
pub fn prepare(file: &FileRecord, max_chars: usize) -> Option<Submission> {
    let content = file.content.as_deref()?;
    let (code, truncation) = truncate(content, max_chars);
    let language = file.language.as_deref().unwrap_or(UNKNOWN_LANGUAGE);

    Some(Submission {
        fingerprint: fingerprint(code),
        truncation,
        request: ExplanationRequest::new(file.path.clone(), language, code),
    })
}
