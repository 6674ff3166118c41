//! lens-core: Analysis pipeline for RepoLens
//!
//! Layer2 - 저장소 분석 파이프라인 레이어
//!
//! # 주요 모듈
//!
//! - `filter`: 분석 대상 선별 (크기 / 경로 세그먼트 / glob / 확장자 / 숨김 파일)
//! - `ranker`: 휴리스틱 점수 기반 우선순위 (유일한 랭킹)
//! - `metrics`: 언어별 라인 수, 주석, 중첩 깊이 (rayon 병렬)
//! - `patterns`: 아키텍처 / API 스타일 / 패키지 매니저 패턴 탐지
//! - `dependencies`: 매니페스트 파싱, 프레임워크 인식
//! - `structure`, `profile`: 디렉터리 통계, 프로젝트 유형
//! - `explain`: 상위 K개 파일 설명 (중복 제거, 동시성 제한, 재시도, 취소)
//! - `insights`, `aggregate`: Summary 생성
//! - `pipeline`: 전체 흐름 (`Analyzer`)
//! - `source`: 저장소 제공자 trait
//!
//! # 사용 예시
//!
//! ```ignore
//! use lens_core::{Analyzer, RepoRef};
//! use lens_foundation::AnalysisConfig;
//! use lens_service::OpenAiExplainer;
//!
//! let analyzer = Analyzer::new(AnalysisConfig::default())?
//!     .with_service(Arc::new(OpenAiExplainer::new(api_key)));
//!
//! let summary = analyzer.run(&provider, &RepoRef::new("demo", "./demo")).await?;
//! println!("{} files, {} explained", summary.metadata.analyzed_files, summary.coverage.succeeded);
//! ```

pub mod aggregate;
pub mod dependencies;
pub mod explain;
pub mod filter;
pub mod insights;
pub mod metrics;
pub mod patterns;
pub mod pipeline;
pub mod profile;
pub mod ranker;
pub mod source;
pub mod structure;

// Re-exports: Pipeline
pub use pipeline::{build_reports, Analyzer};

// Re-exports: Stages
pub use explain::{explain, ExplanationOrchestrator};
pub use filter::{filter, ContentFilter, Rejection};
pub use metrics::{compute, measure_file, FileMetrics};
pub use patterns::{detect, detect_with};
pub use ranker::{prioritize, FileRanker};

// Re-exports: Reports
pub use aggregate::{aggregate, Coverage, ExplainedFile, Reports, Summary};
pub use dependencies::{DependencyReport, ManifestWarning};
pub use insights::{CodeInsights, Mention};
pub use profile::{ProjectProfile, ProjectType, Technologies};
pub use structure::{FileCategories, StructureReport};

// Re-exports: Source
pub use source::{decode_text, RepoRef, RepositoryContentProvider};
