//! Analysis Config - 분석 실행 설정
//!
//! One immutable value per run. Every stage receives the section it needs;
//! nothing reads limits from the environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// AnalysisConfig (통합)
// ============================================================================

/// Complete configuration for one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub filter: FilterConfig,
    pub priority: PriorityWeights,
    pub metrics: MetricsConfig,
    pub explanation: ExplanationConfig,
}

impl AnalysisConfig {
    /// 실행 전 검증. Invalid configuration is rejected before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.metrics.validate()?;
        self.explanation.validate()?;
        Ok(())
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Eligibility rules for discovered files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Files larger than this (bytes) are dropped
    pub max_file_size: u64,
    /// Surviving files are truncated to this count in discovery order
    pub max_files_to_analyze: usize,
    /// Path components excluded anywhere in the path (case-insensitive)
    pub excluded_segments: Vec<String>,
    /// Glob patterns matched against the whole repository path
    pub excluded_globs: Vec<String>,
    /// When non-empty, only these extensions pass
    pub allowed_extensions: Vec<String>,
    /// Binary / media extensions that never pass
    pub excluded_extensions: Vec<String>,
    /// Drop dot-files whose name is not in `hidden_allowlist`
    pub exclude_hidden: bool,
    pub hidden_allowlist: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024, // 1 MiB
            max_files_to_analyze: 500,
            excluded_segments: strings(&[
                ".git",
                "node_modules",
                "__pycache__",
                ".pytest_cache",
                "venv",
                "env",
                ".env",
                "dist",
                "build",
                "target",
                ".next",
                ".nuxt",
                "coverage",
                ".coverage",
                "htmlcov",
                "vendor",
            ]),
            excluded_globs: Vec::new(),
            allowed_extensions: Vec::new(),
            excluded_extensions: strings(&[
                "pyc", "pyo", "so", "dll", "exe", "bin", "dylib", "o", "a", "class", "jar",
                "war", "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "mp3", "mp4",
                "avi", "mov", "wav", "flac", "zip", "tar", "gz", "rar", "7z", "bz2", "pdf",
                "doc", "docx", "xls", "xlsx", "ppt", "pptx", "woff", "woff2", "ttf", "eot",
                "lock",
            ]),
            exclude_hidden: true,
            hidden_allowlist: strings(&[
                ".gitignore",
                ".env.example",
                ".dockerignore",
                ".eslintrc.json",
                ".prettierrc",
                ".travis.yml",
            ]),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::config("filter.max_file_size must be greater than 0"));
        }
        if self.max_files_to_analyze == 0 {
            return Err(Error::config(
                "filter.max_files_to_analyze must be greater than 0",
            ));
        }
        if let Some(seg) = self.excluded_segments.iter().find(|s| s.is_empty() || s.contains('/')) {
            return Err(Error::config(format!(
                "filter.excluded_segments entry '{}' must be a single path component",
                seg
            )));
        }
        for pattern in &self.excluded_globs {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(format!("filter.excluded_globs entry '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// Priority
// ============================================================================

/// Additive scoring weights for the prioritizer.
///
/// The numbers only need to produce a stable, reasonable ordering; they are
/// plain configuration, not product semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Manifest, entry point, README ...
    pub important_name: i64,
    /// Main entry point file names (`main.rs`, `index.ts`, ...)
    pub entry_point: i64,
    pub config_file: i64,
    pub source_extension: i64,
    pub documentation: i64,
    /// File sits at repository root
    pub root_level: i64,
    /// Under `src/`, `lib/`, `app/`, `core/`, ...
    pub significant_dir: i64,
    /// Under `tests/`, `examples/`, `fixtures/`, `assets/`, ... (usually negative)
    pub auxiliary_dir: i64,
    /// Bonus for files inside `[mid_size_min, mid_size_max]` bytes
    pub mid_size: i64,
    pub mid_size_min: u64,
    pub mid_size_max: u64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            important_name: 100,
            entry_point: 60,
            config_file: 50,
            source_extension: 30,
            documentation: 15,
            root_level: 25,
            significant_dir: 20,
            auxiliary_dir: -20,
            mid_size: 5,
            mid_size_min: 512,
            mid_size_max: 64 * 1024,
        }
    }
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// "large" means strictly more lines than this
    pub large_file_lines: usize,
    /// "deeply nested" means strictly deeper than this
    pub deep_nesting_depth: usize,
    /// How many entries the largest-files list keeps
    pub largest_files_count: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            large_file_lines: 500,
            deep_nesting_depth: 6,
            largest_files_count: 10,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.large_file_lines == 0 || self.deep_nesting_depth == 0 {
            return Err(Error::config("metrics thresholds must be greater than 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Explanation
// ============================================================================

/// Retry behavior for explanation requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first one
    pub max_retries: u32,

    /// Initial delay between retries (milliseconds)
    pub initial_delay_ms: u64,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,

    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,

    /// Add ±20% jitter to the computed delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Create a config with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);

        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let final_delay = if self.jitter {
            // 0.8 ~ 1.2
            capped_delay * (0.8 + rand_jitter() * 0.4)
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Simple pseudo-random jitter (0.0 to 1.0)
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Settings for the explanation orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplanationConfig {
    pub enabled: bool,
    /// K: how many top-priority files are explained
    pub max_files: usize,
    /// Hard ceiling of simultaneous in-flight requests
    pub concurrency: usize,
    /// Submitted text is cut to this many characters
    pub max_code_length: usize,
    /// Per-attempt timeout (seconds)
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_files: 15,
            concurrency: 3,
            max_code_length: 8000,
            request_timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl ExplanationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("explanation.concurrency must be at least 1"));
        }
        if self.max_code_length == 0 {
            return Err(Error::config(
                "explanation.max_code_length must be greater than 0",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config(
                "explanation.request_timeout_secs must be greater than 0",
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "explanation.retry.backoff_multiplier must be >= 1.0",
            ));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.filter.max_file_size, 1024 * 1024);
        assert_eq!(config.filter.max_files_to_analyze, 500);
        assert_eq!(config.explanation.concurrency, 3);
        assert_eq!(config.explanation.retry.max_retries, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::default();
        config.explanation.concurrency = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AnalysisConfig::default();
        config.filter.excluded_globs = vec!["src/[".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("excluded_globs"));

        let mut config = AnalysisConfig::default();
        config.filter.max_files_to_analyze = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30000,
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(5), Duration::from_millis(30000)); // capped
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            [explanation]
            max_files = 5

            [filter]
            excluded_segments = ["vendor"]
            "#,
        )
        .unwrap();

        assert_eq!(config.explanation.max_files, 5);
        assert_eq!(config.explanation.concurrency, 3);
        assert_eq!(config.filter.excluded_segments, vec!["vendor".to_string()]);
        assert_eq!(config.filter.max_file_size, 1024 * 1024);
    }
}
