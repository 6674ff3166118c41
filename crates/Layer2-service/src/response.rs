//! Response validation - 서비스 응답 → ExplanationResult
//!
//! Strict at the boundary: a payload becomes `Success` only when it is a JSON
//! object carrying every required field. Anything else is `Degraded` with
//! whatever text could be recovered.

use lens_foundation::{Explanation, ExplanationResult, PartialExplanation};
use serde_json::{Map, Value};

/// Fields a payload must carry to count as a full explanation
pub const REQUIRED_FIELDS: &[&str] = &["summary", "main_functionality", "complexity_assessment"];

const SUMMARY_LIMIT: usize = 200;
const EXCERPT_LIMIT: usize = 500;

/// Validate a raw service response
pub fn parse_response(raw: &str, language: &str) -> ExplanationResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return degraded("empty response", PartialExplanation::default());
    }

    let json_text = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => return degraded("response contains no JSON object", free_text(trimmed)),
    };

    let object = match serde_json::from_str::<Value>(json_text) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return degraded("response JSON is not an object", free_text(trimmed)),
        Err(e) => {
            return degraded(
                &format!("response is not valid JSON: {}", e),
                free_text(trimmed),
            )
        }
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| text_field(&object, field).is_none())
        .collect();

    if !missing.is_empty() {
        let partial = PartialExplanation {
            summary: text_field(&object, "summary"),
            functionality: text_field(&object, "main_functionality"),
            complexity: text_field(&object, "complexity_assessment"),
            excerpt: Some(clip(trimmed, EXCERPT_LIMIT)),
        };
        return degraded(
            &format!("missing required fields: {}", missing.join(", ")),
            partial,
        );
    }

    ExplanationResult::Success(Explanation {
        summary: text_field(&object, "summary").unwrap_or_default(),
        functionality: text_field(&object, "main_functionality").unwrap_or_default(),
        key_components: list_field(&object, "key_components"),
        dependencies: list_field(&object, "dependencies"),
        design_patterns: list_field(&object, "code_patterns"),
        suggestions: list_field(&object, "improvement_suggestions"),
        language: language.to_string(),
        complexity: text_field(&object, "complexity_assessment").unwrap_or_default(),
    })
}

fn degraded(reason: &str, partial: PartialExplanation) -> ExplanationResult {
    ExplanationResult::Degraded {
        reason: reason.to_string(),
        partial,
    }
}

/// First non-JSON line as summary, response prefix as excerpt
fn free_text(text: &str) -> PartialExplanation {
    let summary = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('{'))
        .map(|line| clip(line, SUMMARY_LIMIT));

    PartialExplanation {
        summary,
        functionality: None,
        complexity: None,
        excerpt: Some(clip(text, EXCERPT_LIMIT)),
    }
}

/// Non-empty string field
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Array of strings; non-string items are skipped, a bare string becomes one item
fn list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Cut to `limit` chars, appending "..." when cut
fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
