//! Core Types - 공용 타입 정의
//!
//! 모든 레이어에서 공통으로 사용하는 타입들. Every stage returns new values
//! of these types; nothing produced by an earlier stage is mutated later.

use crate::language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// FileRecord - 저장소 파일
// ============================================================================

/// One file of a repository snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// `/`-separated path, unique within the snapshot
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Detected language tag
    pub language: Option<String>,
    /// Text content; absent for binary or unfetched files
    #[serde(skip)]
    pub content: Option<String>,
}

impl FileRecord {
    /// Metadata-only record; language is detected from the path
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let language = language::detect(&path).map(|l| l.name.to_string());
        Self {
            path,
            size,
            language,
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn file_name(&self) -> &str {
        language::file_name_of(&self.path)
    }

    pub fn extension(&self) -> Option<String> {
        language::extension_of(&self.path)
    }

    /// Directory components (the file name excluded)
    pub fn dir_segments(&self) -> impl Iterator<Item = &str> {
        let mut parts: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        parts.pop();
        parts.into_iter()
    }

    /// Number of directories above the file (root files are 0)
    pub fn depth(&self) -> usize {
        self.dir_segments().count()
    }
}

impl AsRef<FileRecord> for FileRecord {
    fn as_ref(&self) -> &FileRecord {
        self
    }
}

// ============================================================================
// PrioritizedFile - 우선순위 결과
// ============================================================================

/// A file with its priority score and 1-based rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedFile {
    pub file: FileRecord,
    pub score: i64,
    pub rank: usize,
}

impl PrioritizedFile {
    pub fn path(&self) -> &str {
        &self.file.path
    }
}

impl AsRef<FileRecord> for PrioritizedFile {
    fn as_ref(&self) -> &FileRecord {
        &self.file
    }
}

// ============================================================================
// Pattern Finding - 아키텍처/의존성 패턴
// ============================================================================

/// API style classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    Rest,
    #[serde(rename = "graphql")]
    GraphQl,
    Rpc,
    Unknown,
}

/// Package managers recognised from manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Pip,
    Pipenv,
    Poetry,
    Cargo,
    GoModules,
    Maven,
    Gradle,
    Bundler,
    Composer,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Pip => "pip",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
            Self::Cargo => "cargo",
            Self::GoModules => "go modules",
            Self::Maven => "maven",
            Self::Gradle => "gradle",
            Self::Bundler => "bundler",
            Self::Composer => "composer",
        }
    }
}

/// Closed set of detectable patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "pattern", content = "detail", rename_all = "snake_case")]
pub enum PatternKind {
    Mvc,
    Microservices,
    CleanArchitecture,
    ComponentBased,
    ApiFirst,
    EventDriven,
    Containerized,
    Monorepo,
    Api(ApiStyle),
    PackageManager(PackageManager),
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mvc => write!(f, "MVC (Model-View-Controller)"),
            Self::Microservices => write!(f, "Microservices"),
            Self::CleanArchitecture => write!(f, "Clean Architecture"),
            Self::ComponentBased => write!(f, "Component-Based Architecture"),
            Self::ApiFirst => write!(f, "API-First Design"),
            Self::EventDriven => write!(f, "Event-Driven Architecture"),
            Self::Containerized => write!(f, "Containerized"),
            Self::Monorepo => write!(f, "Monorepo"),
            Self::Api(ApiStyle::Rest) => write!(f, "REST API"),
            Self::Api(ApiStyle::GraphQl) => write!(f, "GraphQL API"),
            Self::Api(ApiStyle::Rpc) => write!(f, "RPC API"),
            Self::Api(ApiStyle::Unknown) => write!(f, "API (unknown style)"),
            Self::PackageManager(pm) => write!(f, "Package manager: {}", pm.as_str()),
        }
    }
}

/// A triggered pattern plus the paths / dependency names that triggered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFinding {
    pub kind: PatternKind,
    pub evidence: BTreeSet<String>,
}

// ============================================================================
// Explanation - 설명 결과
// ============================================================================

/// Why an explanation request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    RateLimit,
    Auth,
    Malformed,
    Transport,
    Cancelled,
}

impl ErrorKind {
    /// Transient kinds are retried with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimit | Self::Transport)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::Auth => "auth",
            Self::Malformed => "malformed",
            Self::Transport => "transport",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully validated explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub functionality: String,
    pub key_components: Vec<String>,
    pub dependencies: Vec<String>,
    pub design_patterns: Vec<String>,
    pub suggestions: Vec<String>,
    pub language: String,
    /// Opaque label supplied by the service, recorded verbatim
    pub complexity: String,
}

/// Whatever text could be recovered from an unusable response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialExplanation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functionality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    /// Raw response prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// Outcome of explaining one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExplanationResult {
    Success(Explanation),
    /// The service answered but the payload failed validation
    Degraded {
        reason: String,
        partial: PartialExplanation,
    },
    /// The call errored (after retries for transient kinds)
    Failed {
        kind: ErrorKind,
        /// Attempts made before settling; 0 when never submitted
        attempts: u32,
    },
}

impl ExplanationResult {
    pub fn failed(kind: ErrorKind, attempts: u32) -> Self {
        Self::Failed { kind, attempts }
    }

    pub fn cancelled() -> Self {
        Self::Failed {
            kind: ErrorKind::Cancelled,
            attempts: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Submitted text was cut to a prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    pub original_chars: usize,
    pub submitted_chars: usize,
}

/// Orchestrator output for one selected path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationRecord {
    /// Fingerprint of the submitted text; `None` when nothing was submitted
    pub fingerprint: Option<String>,
    /// Present when the explanation covers only a prefix of the file
    pub truncation: Option<Truncation>,
    pub result: ExplanationResult,
}

impl ExplanationRecord {
    pub fn unsubmitted(result: ExplanationResult) -> Self {
        Self {
            fingerprint: None,
            truncation: None,
            result,
        }
    }
}

// ============================================================================
// Run Metadata
// ============================================================================

/// Identity and counts of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Files handed to the pipeline
    pub discovered_files: usize,
    /// Files that survived filtering
    pub analyzed_files: usize,
    /// Files selected for explanation
    pub explained_files: usize,
    /// Unique submissions after fingerprint dedup
    pub explanation_requests: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_paths() {
        let file = FileRecord::new("src/core/lib.rs", 10);
        assert_eq!(file.file_name(), "lib.rs");
        assert_eq!(file.language.as_deref(), Some("Rust"));
        assert_eq!(file.dir_segments().collect::<Vec<_>>(), vec!["src", "core"]);
        assert_eq!(file.depth(), 2);
        assert_eq!(FileRecord::new("README.md", 1).depth(), 0);
    }

    #[test]
    fn test_content_not_serialized() {
        let file = FileRecord::new("a.py", 3).with_content("x=1");
        let json = serde_json::to_string(&file).unwrap();
        assert!(!json.contains("x=1"));
    }

    #[test]
    fn test_result_serialization_is_tagged() {
        let json = serde_json::to_value(ExplanationResult::failed(ErrorKind::Timeout, 3)).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "timeout");
        assert_eq!(json["attempts"], 3);
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::Timeout.is_transient());
        assert!(ErrorKind::RateLimit.is_transient());
        assert!(!ErrorKind::Auth.is_transient());
        assert!(!ErrorKind::Malformed.is_transient());
    }
}
