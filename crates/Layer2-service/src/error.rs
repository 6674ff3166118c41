//! Service-specific error types
//!
//! ServiceError는 설명 서비스 호출 실패를 표현합니다.
//! 오케스트레이터는 `kind()`로 분류하여 결과 값(`Failed{kind}`)에 기록합니다.

use crate::retry::{RetryClassification, RetryableError};
use lens_foundation::ErrorKind;
use thiserror::Error;

/// Errors that can occur while calling an explanation service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The attempt did not finish in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// API key is missing or rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Request or response could not be used (bad input, unparseable body)
    #[error("Malformed: {0}")]
    Malformed(String),

    /// Network / server failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    /// 결과 값에 기록할 에러 종류
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Timeout(_) => ErrorKind::Timeout,
            ServiceError::RateLimited { .. } => ErrorKind::RateLimit,
            ServiceError::Authentication(_) => ErrorKind::Auth,
            ServiceError::Malformed(_) => ErrorKind::Malformed,
            ServiceError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ServiceError::Authentication(body.to_string()),
            408 | 504 => ServiceError::Timeout(format!("HTTP {}", status)),
            429 => ServiceError::RateLimited {
                retry_after_ms: extract_retry_after(body),
            },
            400 | 404 | 413 | 422 => ServiceError::Malformed(format!("HTTP {}: {}", status, body)),
            500..=599 => ServiceError::Transport(format!("HTTP {}: {}", status, body)),
            _ => ServiceError::Transport(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl RetryableError for ServiceError {
    fn classify(&self) -> RetryClassification {
        match self {
            ServiceError::RateLimited { retry_after_ms } => RetryClassification::RateLimited {
                retry_after_ms: *retry_after_ms,
            },
            ServiceError::Timeout(_) | ServiceError::Transport(_) => RetryClassification::Retry,
            ServiceError::Authentication(_) | ServiceError::Malformed(_) => {
                RetryClassification::NoRetry
            }
        }
    }
}

/// Try to extract retry-after value from error body (in milliseconds)
fn extract_retry_after(body: &str) -> Option<u64> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(secs) = json
            .get("error")
            .and_then(|e| e.get("retry_after"))
            .and_then(|v| v.as_f64())
        {
            return Some((secs * 1000.0) as u64);
        }
    }

    // "Please retry after 20 seconds"
    let idx = body.find("retry")?;
    let num_str: String = body[idx..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    num_str.parse::<f64>().ok().map(|secs| (secs * 1000.0) as u64)
}
