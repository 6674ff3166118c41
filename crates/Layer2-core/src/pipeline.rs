//! Analyzer - 분석 파이프라인
//!
//! ```text
//! files ─▶ ContentFilter ─▶ FileRanker ─┬─▶ (blocking) metrics / patterns / structure / deps / profile
//!                                        └─▶ (async)    ExplanationOrchestrator (top-K)
//!                                                      │
//!                                                      ▼
//!                                                  aggregate ─▶ Summary
//! ```
//!
//! Configuration is validated before any work starts. Provider errors are
//! fatal; explanation failures are recorded in the summary.

use crate::aggregate::{aggregate, Reports, Summary};
use crate::explain::ExplanationOrchestrator;
use crate::filter::ContentFilter;
use crate::source::{decode_text, RepoRef, RepositoryContentProvider};
use crate::{dependencies, metrics, patterns, profile, ranker, structure};
use chrono::Utc;
use lens_foundation::{
    AnalysisConfig, Error, FileRecord, MetricsConfig, PrioritizedFile, Result, RunMetadata,
};
use lens_service::ExplanationService;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 저장소 분석기
pub struct Analyzer {
    config: AnalysisConfig,
    service: Option<Arc<dyn ExplanationService>>,
    cancel: CancellationToken,
}

impl Analyzer {
    /// Validates the config; nothing runs on an invalid one
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            service: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_service(mut self, service: Arc<dyn ExplanationService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Token that stops outstanding explanation requests
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of files to explain this run
    fn explain_limit(&self) -> usize {
        if !self.config.explanation.enabled {
            return 0;
        }
        if self.service.is_none() {
            warn!("Explanations enabled but no service configured; skipping");
            return 0;
        }
        self.config.explanation.max_files
    }

    /// Analyze files that already carry their content
    pub async fn analyze(&self, files: Vec<FileRecord>) -> Result<Summary> {
        let discovered = files.len();
        self.analyze_files(files, discovered, None).await
    }

    /// List, filter, fetch and analyze a repository
    pub async fn run(
        &self,
        provider: &dyn RepositoryContentProvider,
        repo: &RepoRef,
    ) -> Result<Summary> {
        info!("Listing {}", repo.name);
        let listed = provider.list_files(repo).await?;
        let discovered = listed.len();

        // 메타데이터로 먼저 거른 뒤 남은 파일만 내용 조회
        let kept = ContentFilter::new(&self.config.filter)?.apply(listed);

        let mut files = Vec::with_capacity(kept.len());
        for file in kept {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let content = provider
                .get_content(repo, &file.path)
                .await?
                .and_then(decode_text);
            if content.is_none() {
                debug!("{}: no text content", file.path);
            }
            files.push(FileRecord { content, ..file });
        }

        self.analyze_files(files, discovered, Some(repo.name.clone()))
            .await
    }

    async fn analyze_files(
        &self,
        files: Vec<FileRecord>,
        discovered: usize,
        repository: Option<String>,
    ) -> Result<Summary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Run {} started: {} files", run_id, discovered);

        // ====================================================================
        // 1. Filter + Rank
        // ====================================================================
        let filtered = ContentFilter::new(&self.config.filter)?.apply(files);
        let ranking = Arc::new(ranker::prioritize(filtered, &self.config.priority));
        let limit = self.explain_limit();

        // ====================================================================
        // 2. Reports (blocking pool) ‖ Explanations (async)
        // ====================================================================
        let reports_task = tokio::task::spawn_blocking({
            let ranking = Arc::clone(&ranking);
            let metrics_config = self.config.metrics.clone();
            move || build_reports(&ranking, &metrics_config)
        });

        let records = match &self.service {
            Some(service) if limit > 0 => {
                let mut config = self.config.explanation.clone();
                config.max_files = limit;
                ExplanationOrchestrator::new(Arc::clone(service), config)
                    .explain(&ranking, self.cancel.child_token())
                    .await
            }
            _ => BTreeMap::new(),
        };

        let reports = reports_task
            .await
            .map_err(|e| Error::contract(format!("report task failed: {}", e)))?;

        // ====================================================================
        // 3. Aggregate
        // ====================================================================
        let ranking = Arc::try_unwrap(ranking).unwrap_or_else(|shared| (*shared).clone());
        let metadata = RunMetadata {
            run_id,
            started_at,
            finished_at: Utc::now(),
            discovered_files: discovered,
            analyzed_files: 0,
            explained_files: 0,
            explanation_requests: 0,
            repository,
        };

        let summary = aggregate(reports, ranking, records, limit, metadata)?;
        info!(
            "Run {} finished: {} analyzed, {} explained ({} ok, {} degraded, {} failed)",
            run_id,
            summary.metadata.analyzed_files,
            summary.coverage.selected,
            summary.coverage.succeeded,
            summary.coverage.degraded,
            summary.coverage.failed
        );
        Ok(summary)
    }
}

/// Repository-wide reports over the ranked files
pub fn build_reports(files: &[PrioritizedFile], metrics_config: &MetricsConfig) -> Reports {
    let deps = dependencies::analyze(files);
    Reports {
        metrics: metrics::compute(files, metrics_config),
        patterns: patterns::detect_with(files, &deps),
        structure: structure::analyze(files),
        profile: profile::profile(files, &deps),
        dependencies: deps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lens_foundation::{ErrorKind, ExplanationResult, PatternKind, ProviderError};
    use lens_service::{ExplanationRequest, ServiceError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const VALID: &str = r#"{"summary":"ok","main_functionality":"does things","complexity_assessment":"Medium"}"#;

    struct StubService {
        hang: bool,
        calls: AtomicUsize,
    }

    impl StubService {
        fn new(hang: bool) -> Arc<Self> {
            Arc::new(Self {
                hang,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExplanationService for StubService {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(
            &self,
            _request: &ExplanationRequest,
            _timeout: Duration,
        ) -> std::result::Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(VALID.to_string())
        }
    }

    fn repo_files() -> Vec<FileRecord> {
        let file = |path: &str, content: &str| {
            FileRecord::new(path, content.len() as u64).with_content(content)
        };
        vec![
            file("README.md", "# Demo\n"),
            file("vendor/lib.js", "var x = 1;\n"),
            file("Dockerfile", "FROM python:3.12\n"),
            file("requirements.txt", "flask\n"),
            file("src/app.py", "from flask import Flask\napp = Flask(__name__)\n"),
            file("src/models.py", "class User:\n    pass\n"),
            file("tests/test_app.py", "def test_ok():\n    assert True\n"),
        ]
    }

    fn config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.explanation.max_files = 3;
        config.explanation.request_timeout_secs = 2;
        config
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let service = StubService::new(false);
        let analyzer = Analyzer::new(config()).unwrap().with_service(service.clone());

        let summary = analyzer.analyze(repo_files()).await.unwrap();

        assert_eq!(summary.metadata.discovered_files, 7);
        assert_eq!(summary.metadata.analyzed_files, 6);
        assert!(summary.ranking.iter().all(|p| p.path() != "vendor/lib.js"));
        assert_eq!(summary.explanations.len(), 3);
        assert_eq!(summary.coverage.succeeded, 3);
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        assert_eq!(summary.profile.project_type, crate::profile::ProjectType::Flask);
        assert!(summary
            .patterns
            .iter()
            .any(|p| p.kind == PatternKind::Containerized));

        // 설명 순서 = 우선순위 순서
        let ranks: Vec<usize> = summary.explanations.iter().map(|e| e.file.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_do_not_affect_reports() {
        let hanging = Analyzer::new(config())
            .unwrap()
            .with_service(StubService::new(true));
        let offline = Analyzer::new(config()).unwrap();

        let failed = hanging.analyze(repo_files()).await.unwrap();
        let baseline = offline.analyze(repo_files()).await.unwrap();

        assert_eq!(failed.explanations.len(), 3);
        for explained in &failed.explanations {
            assert_eq!(
                explained.record.result,
                ExplanationResult::failed(ErrorKind::Timeout, 3)
            );
        }
        assert_eq!(failed.metrics, baseline.metrics);
        assert_eq!(failed.patterns, baseline.patterns);
        assert_eq!(failed.ranking, baseline.ranking);
        assert!(baseline.explanations.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_up_front() {
        let mut config = config();
        config.explanation.concurrency = 0;
        assert!(matches!(Analyzer::new(config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_largest_files_do_not_reorder_ranking() {
        let big = "x = 1\n".repeat(300);
        let files = vec![
            FileRecord::new("tests/fixtures/big_case.py", big.len() as u64).with_content(big),
            FileRecord::new("README.md", 20).with_content("# Demo\nSmall.\n"),
        ];

        let summary = Analyzer::new(AnalysisConfig::default())
            .unwrap()
            .analyze(files)
            .await
            .unwrap();

        let ranked: Vec<&str> = summary.ranking.iter().map(|f| f.path()).collect();
        assert_eq!(ranked, vec!["README.md", "tests/fixtures/big_case.py"]);

        let largest: Vec<(&str, usize)> = summary
            .metrics
            .largest_files
            .iter()
            .map(|f| (f.path.as_str(), f.value))
            .collect();
        assert_eq!(
            largest,
            vec![("tests/fixtures/big_case.py", 300), ("README.md", 2)]
        );
    }

    struct MemoryProvider {
        fail_listing: bool,
    }

    #[async_trait]
    impl RepositoryContentProvider for MemoryProvider {
        async fn list_files(
            &self,
            _repo: &RepoRef,
        ) -> std::result::Result<Vec<FileRecord>, ProviderError> {
            if self.fail_listing {
                return Err(ProviderError::NotFound("repo".into()));
            }
            Ok(vec![
                FileRecord::new("main.py", 12),
                FileRecord::new("blob.raw", 4),
                FileRecord::new("node_modules/x.js", 1),
            ])
        }

        async fn get_content(
            &self,
            _repo: &RepoRef,
            path: &str,
        ) -> std::result::Result<Option<Vec<u8>>, ProviderError> {
            match path {
                "main.py" => Ok(Some(b"print('hi')\n".to_vec())),
                "blob.raw" => Ok(Some(vec![0x89, 0x00, 0xff, 0x10])),
                other => panic!("{} should have been filtered before fetching", other),
            }
        }
    }

    #[tokio::test]
    async fn test_run_fetches_filtered_files_only() {
        let analyzer = Analyzer::new(config()).unwrap();
        let repo = RepoRef::new("demo", "/tmp/demo");

        let summary = analyzer
            .run(&MemoryProvider { fail_listing: false }, &repo)
            .await
            .unwrap();

        assert_eq!(summary.metadata.discovered_files, 3);
        assert_eq!(summary.metadata.repository.as_deref(), Some("demo"));
        assert_eq!(summary.ranking.len(), 2);
        let blob = summary
            .ranking
            .iter()
            .find(|p| p.path() == "blob.raw")
            .unwrap();
        assert!(blob.file.content.is_none());
        assert_eq!(summary.metrics.totals.total_lines, 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_fatal() {
        let analyzer = Analyzer::new(config()).unwrap();
        let err = analyzer
            .run(&MemoryProvider { fail_listing: true }, &RepoRef::new("x", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NotFound(_))));
    }
}
