//! Core Module - 분석 파이프라인 데이터 모델
//!
//! - `types.rs`: FileRecord, PrioritizedFile, PatternFinding, ExplanationResult, RunMetadata
//! - `metrics.rs`: MetricsSnapshot (결합 가능한 집계)

mod metrics;
mod types;

pub use metrics::{FlaggedFile, LineStats, MetricsSnapshot, UNKNOWN_LANGUAGE};
pub use types::{
    ApiStyle, ErrorKind, Explanation, ExplanationRecord, ExplanationResult, FileRecord,
    PackageManager, PartialExplanation, PatternFinding, PatternKind, PrioritizedFile, RunMetadata,
    Truncation,
};
