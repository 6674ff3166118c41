//! Analysis prompt

use crate::ExplanationRequest;

/// System message sent with every request
pub const SYSTEM_PROMPT: &str = "You are an expert software engineer who provides clear, \
detailed code analysis and explanations. Always respond with valid JSON format.";

/// Build the user prompt for one request
pub fn build_prompt(request: &ExplanationRequest) -> String {
    format!(
        r#"As an expert software engineer, analyze the following {language} code from the file `{path}` and explain it for a developer reading it for the first time.

```{fence}
{code}
```

Respond with a single JSON object:

{{
    "summary": "2-3 sentence overview of what this file does",
    "main_functionality": "Primary purpose and behavior in detail",
    "key_components": ["Main classes, functions or components and their purposes"],
    "dependencies": ["External libraries, modules or services this code depends on"],
    "complexity_assessment": "Simple/Moderate/Complex/Very Complex, with brief reasoning",
    "improvement_suggestions": ["Concrete improvements, best practices or potential issues"],
    "code_patterns": ["Design, architectural or coding patterns used"]
}}

Focus on what the code actually does, how it fits into a larger application, its key algorithms, and potential issues. Be specific and technical."#,
        language = request.language,
        path = request.path,
        fence = request.language.to_lowercase(),
        code = request.code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_request() {
        let request = ExplanationRequest::new("src/lib.rs", "Rust", "fn main() {}");
        let prompt = build_prompt(&request);
        assert!(prompt.contains("`src/lib.rs`"));
        assert!(prompt.contains("```rust\nfn main() {}\n```"));
        assert!(prompt.contains("\"complexity_assessment\""));
    }
}
