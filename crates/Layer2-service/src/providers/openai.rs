//! OpenAI-compatible chat-completions explainer
//!
//! Works against api.openai.com, any OpenAI-compatible endpoint (`with_base_url`)
//! and Azure OpenAI deployments (`azure`), which authenticate with an
//! `api-key` header instead of a bearer token.

use crate::{
    error::ServiceError,
    prompt::{build_prompt, SYSTEM_PROMPT},
    r#trait::{ExplanationRequest, ExplanationService},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1500;
const DEFAULT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>` (Azure)
    ApiKeyHeader,
}

/// OpenAI / Azure OpenAI explanation service
pub struct OpenAiExplainer {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    auth: AuthStyle,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiExplainer {
    /// Create a new OpenAI explainer
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            url: DEFAULT_API_URL.to_string(),
            auth: AuthStyle::Bearer,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Azure OpenAI deployment (`{endpoint}/openai/deployments/{deployment}/chat/completions`)
    pub fn azure(
        api_key: impl Into<String>,
        endpoint: &str,
        deployment: impl Into<String>,
        api_version: Option<&str>,
    ) -> Self {
        let deployment = deployment.into();
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version.unwrap_or(DEFAULT_AZURE_API_VERSION)
        );
        Self {
            model: deployment,
            url,
            auth: AuthStyle::ApiKeyHeader,
            ..Self::new(api_key)
        }
    }

    /// Create with custom base URL (for OpenAI-compatible APIs like LocalAI, vLLM, etc.)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.url = if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        };
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(&self, request: &ExplanationRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(request),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Parse error response from OpenAI API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> ServiceError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error = error_response.error;
            let message = error.message;

            return match error.code.as_deref() {
                Some("rate_limit_exceeded") => ServiceError::from_http_status(429, body),
                Some("invalid_api_key") | Some("insufficient_quota") => {
                    ServiceError::Authentication(message)
                }
                Some("context_length_exceeded") | Some("content_policy_violation") => {
                    ServiceError::Malformed(message)
                }
                _ => ServiceError::from_http_status(status.as_u16(), &message),
            };
        }

        ServiceError::from_http_status(status.as_u16(), body)
    }
}

#[async_trait]
impl ExplanationService for OpenAiExplainer {
    fn name(&self) -> &str {
        match self.auth {
            AuthStyle::Bearer => "openai",
            AuthStyle::ApiKeyHeader => "azure-openai",
        }
    }

    async fn analyze(
        &self,
        request: &ExplanationRequest,
        timeout: Duration,
    ) -> Result<String, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::Authentication("API key is not set".to_string()));
        }

        let body = self.build_request(request);
        let builder = self.client.post(&self.url).timeout(timeout).json(&body);
        let builder = match self.auth {
            AuthStyle::Bearer => builder.header("Authorization", format!("Bearer {}", self.api_key)),
            AuthStyle::ApiKeyHeader => builder.header("api-key", &self.api_key),
        };

        debug!("POST {} ({}, {} chars)", self.url, request.path, request.code.len());

        let response = builder.send().await.map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Malformed("No content in response".to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(e.to_string())
    } else {
        ServiceError::Transport(e.to_string())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    code: Option<String>,
}
