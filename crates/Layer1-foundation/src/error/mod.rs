//! Error types for RepoLens
//!
//! 모든 에러를 중앙에서 관리
//!
//! Run-fatal conditions (bad configuration, repository provider failures,
//! broken internal contracts) are `Error`. Per-file explanation failures are
//! never errors; they are recorded as values in the summary.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// RepoLens 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    /// Invalid filter/priority/limit configuration, rejected before any work
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Repository provider 관련
    // ========================================================================
    /// Listing or fetching repository content failed; fatal for the run
    #[error("Repository provider error: {0}")]
    Provider(#[from] ProviderError),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    /// An internal invariant was broken. This is a defect, not a runtime condition.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Configuration error helper
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Contract violation helper
    pub fn contract(message: impl Into<String>) -> Self {
        Error::ContractViolation(message.into())
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Provider(_) | Error::Cancelled)
    }
}

// ============================================================================
// ProviderError - repository content provider
// ============================================================================

/// Failures reported by a repository content provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Repository or path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider throttled the listing or fetch
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Connection, DNS or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(String),

    /// Provider answered with something that could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => ProviderError::Authentication(err.to_string()),
            _ => ProviderError::Io(err.to_string()),
        }
    }
}
