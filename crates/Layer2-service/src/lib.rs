//! # lens-service
//!
//! Explanation service abstraction layer for RepoLens.
//!
//! ## Features
//! - `ExplanationService` trait: snippet + language + timeout → raw text
//! - Automatic retry with exponential backoff (transient kinds only)
//! - Strict response validation into `Success` / `Degraded`
//! - OpenAI-compatible client (OpenAI, Azure OpenAI, local endpoints)

pub mod error;
pub mod prompt;
pub mod providers;
pub mod response;
pub mod retry;
pub mod r#trait;

// Core trait and types
pub use r#trait::{ExplanationRequest, ExplanationService};

// Error and retry
pub use error::ServiceError;
pub use retry::{with_retry, RetryClassification, RetryableError};

// Prompt / validation
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use response::{parse_response, REQUIRED_FIELDS};

// Service implementations
pub use providers::openai::OpenAiExplainer;
