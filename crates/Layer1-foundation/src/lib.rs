//! # lens-foundation
//!
//! Foundation layer for RepoLens:
//! - Error: 실행 치명 에러 (Config / Provider / ContractViolation)
//! - Config: AnalysisConfig + 계층형 ConfigLoader
//! - Core: 파이프라인 데이터 모델 (FileRecord → Summary 재료)
//! - Language: 확장자 → 언어 / 주석 문법 / 중첩 방식
//! - Cache: 콘텐츠 fingerprint
//!
//! ## 데이터 흐름
//!
//! ```text
//! FileRecord ──▶ filter ──▶ prioritize ──┬──▶ MetricsSnapshot
//!                                        ├──▶ PatternFinding
//!                                        └──▶ ExplanationRecord (top-K)
//!                                                   │
//!                                                   ▼
//!                                                Summary
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod language;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, ProviderError, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    AnalysisConfig, ConfigLoader, ExplanationConfig, FilterConfig, MetricsConfig,
    PriorityWeights, RetryConfig,
};

// ============================================================================
// Core (데이터 모델)
// ============================================================================
pub use core::{
    ApiStyle, ErrorKind, Explanation, ExplanationRecord, ExplanationResult, FileRecord,
    FlaggedFile, LineStats, MetricsSnapshot, PackageManager, PartialExplanation, PatternFinding,
    PatternKind, PrioritizedFile, RunMetadata, Truncation, UNKNOWN_LANGUAGE,
};

// ============================================================================
// Language / Cache
// ============================================================================
pub use cache::{fingerprint, short_fingerprint};
pub use language::{CommentSyntax, LanguageSpec, NestingStyle};
