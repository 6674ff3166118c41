//! ExplanationService trait and request type

use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One submission: a (possibly truncated) code snippet plus context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    /// Repository path, used in the prompt only
    pub path: String,
    /// Language tag (`"Rust"`, `"Python"`, ...)
    pub language: String,
    /// Text to explain
    pub code: String,
}

impl ExplanationRequest {
    pub fn new(
        path: impl Into<String>,
        language: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            code: code.into(),
        }
    }
}

/// External text-generation service.
///
/// Implementations return the raw response text; structural validation
/// happens in [`crate::response::parse_response`].
#[async_trait]
pub trait ExplanationService: Send + Sync {
    /// Service name for logs (e.g. "openai")
    fn name(&self) -> &str;

    /// Explain one snippet. `timeout` bounds this single attempt.
    async fn analyze(
        &self,
        request: &ExplanationRequest,
        timeout: Duration,
    ) -> Result<String, ServiceError>;
}
