//! Explanation Orchestrator - 병렬 설명 요청 관리
//!
//! Takes the top-K prioritized files, deduplicates them by the fingerprint of
//! the text that would be submitted and sends each unique text to the
//! explanation service exactly once.
//!
//! - Admission goes through a semaphore in priority order, so no more than
//!   `concurrency` requests are in flight and higher-ranked files start first.
//! - Each attempt is bounded by `request_timeout`; transient failures are
//!   retried with backoff.
//! - Every selected path settles to exactly one record. Cancellation turns
//!   pending and in-flight work into `Failed { kind: Cancelled }`.

use super::submission::{prepare, Submission};
use lens_foundation::{
    short_fingerprint, ErrorKind, ExplanationConfig, ExplanationRecord, ExplanationResult,
    PrioritizedFile, Truncation,
};
use lens_service::{parse_response, with_retry, ExplanationRequest, ExplanationService, ServiceError};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One unique submission and the paths that share it
///
/// Each path keeps its own truncation: files that differ only past the
/// cutoff share a request but not a truncation record.
struct Unique {
    submission: Submission,
    paths: Vec<(String, Option<Truncation>)>,
}

/// 설명 오케스트레이터
pub struct ExplanationOrchestrator {
    service: Arc<dyn ExplanationService>,
    config: Arc<ExplanationConfig>,
}

impl ExplanationOrchestrator {
    pub fn new(service: Arc<dyn ExplanationService>, config: ExplanationConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Explain the top `max_files` entries of `ranked`.
    ///
    /// The returned map has exactly one record per selected path.
    pub async fn explain(
        &self,
        ranked: &[PrioritizedFile],
        cancel: CancellationToken,
    ) -> BTreeMap<String, ExplanationRecord> {
        let selected = &ranked[..ranked.len().min(self.config.max_files)];
        let mut records = BTreeMap::new();

        // ====================================================================
        // 1. 준비 + 중복 제거 (우선순위 순서 유지)
        // ====================================================================
        let mut uniques: Vec<Unique> = Vec::new();
        let mut by_fingerprint: HashMap<String, usize> = HashMap::new();

        for file in selected {
            let Some(submission) = prepare(&file.file, self.config.max_code_length) else {
                debug!("{}: no content, not submitted", file.path());
                records.insert(
                    file.path().to_string(),
                    ExplanationRecord::unsubmitted(ExplanationResult::failed(
                        ErrorKind::Malformed,
                        0,
                    )),
                );
                continue;
            };

            match by_fingerprint.get(&submission.fingerprint) {
                Some(&idx) => {
                    debug!(
                        "{}: same text as {} ({})",
                        file.path(),
                        uniques[idx].paths[0].0,
                        short_fingerprint(&submission.fingerprint)
                    );
                    uniques[idx]
                        .paths
                        .push((file.path().to_string(), submission.truncation));
                }
                None => {
                    by_fingerprint.insert(submission.fingerprint.clone(), uniques.len());
                    let paths = vec![(file.path().to_string(), submission.truncation)];
                    uniques.push(Unique { submission, paths });
                }
            }
        }

        info!(
            "Explaining {} files ({} unique requests, concurrency {})",
            selected.len(),
            uniques.len(),
            self.config.concurrency
        );

        // ====================================================================
        // 2. 세마포어로 입장 제어 후 병렬 실행
        // ====================================================================
        let results = self.run(&uniques, &cancel).await;

        // ====================================================================
        // 3. 경로별 결과 정리
        // ====================================================================
        for (unique, result) in uniques.into_iter().zip(results) {
            for (path, truncation) in unique.paths {
                records.insert(
                    path,
                    ExplanationRecord {
                        fingerprint: Some(unique.submission.fingerprint.clone()),
                        truncation,
                        result: result.clone(),
                    },
                );
            }
        }

        records
    }

    /// One result per unique submission, in input order
    async fn run(&self, uniques: &[Unique], cancel: &CancellationToken) -> Vec<ExplanationResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for (idx, unique) in uniques.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let service = Arc::clone(&self.service);
            let config = Arc::clone(&self.config);
            let request = unique.submission.request.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ExplanationResult::cancelled(),
                    result = submit(service.as_ref(), &request, &config) => result,
                };
                (idx, result)
            });
        }

        let mut results: Vec<Option<ExplanationResult>> = vec![None; uniques.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) => warn!("Explanation task failed: {}", e),
            }
        }

        results
            .into_iter()
            .map(|result| match result {
                Some(result) => result,
                None if cancel.is_cancelled() => ExplanationResult::cancelled(),
                None => ExplanationResult::failed(ErrorKind::Transport, 0),
            })
            .collect()
    }
}

/// Send one request with per-attempt timeout and retry, then validate the response
async fn submit(
    service: &dyn ExplanationService,
    request: &ExplanationRequest,
    config: &ExplanationConfig,
) -> ExplanationResult {
    let attempts = AtomicU32::new(0);
    let timeout = config.request_timeout();

    let outcome = with_retry(&config.retry, &request.path, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            match tokio::time::timeout(timeout, service.analyze(request, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout(format!(
                    "no response within {:?}",
                    timeout
                ))),
            }
        }
    })
    .await;

    match outcome {
        Ok(raw) => {
            let result = parse_response(&raw, &request.language);
            if let ExplanationResult::Degraded { reason, .. } = &result {
                debug!("{}: degraded ({})", request.path, reason);
            }
            result
        }
        Err(e) => {
            let attempts = attempts.load(Ordering::SeqCst);
            warn!(
                "{}: failed after {} attempt(s): {}",
                request.path, attempts, e
            );
            ExplanationResult::failed(e.kind(), attempts)
        }
    }
}

/// Explain with a one-off orchestrator
pub async fn explain(
    ranked: &[PrioritizedFile],
    service: Arc<dyn ExplanationService>,
    config: &ExplanationConfig,
    cancel: CancellationToken,
) -> BTreeMap<String, ExplanationRecord> {
    ExplanationOrchestrator::new(service, config.clone())
        .explain(ranked, cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lens_foundation::{FileRecord, RetryConfig};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    const VALID: &str = r#"{"summary":"Adds numbers","main_functionality":"Sums two ints","complexity_assessment":"Low","key_components":["add"]}"#;

    #[derive(Clone)]
    enum Behavior {
        Respond(&'static str),
        Hang,
        Fail(ServiceError),
    }

    struct MockService {
        behavior: Behavior,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        codes: Mutex<Vec<String>>,
    }

    impl MockService {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                delay: Duration::from_millis(100),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                codes: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExplanationService for MockService {
        fn name(&self) -> &str {
            "mock"
        }

        async fn analyze(
            &self,
            request: &ExplanationRequest,
            _timeout: Duration,
        ) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.codes.lock().unwrap().push(request.code.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Behavior::Hang = self.behavior {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match &self.behavior {
                Behavior::Respond(text) => Ok(text.to_string()),
                Behavior::Fail(e) => Err(e.clone()),
                Behavior::Hang => unreachable!(),
            }
        }
    }

    fn config(max_files: usize, concurrency: usize) -> ExplanationConfig {
        ExplanationConfig {
            max_files,
            concurrency,
            request_timeout_secs: 5,
            retry: RetryConfig {
                max_retries: 2,
                initial_delay_ms: 100,
                backoff_multiplier: 2.0,
                max_delay_ms: 1000,
                jitter: false,
            },
            ..Default::default()
        }
    }

    fn ranked(contents: &[Option<&str>]) -> Vec<PrioritizedFile> {
        contents
            .iter()
            .enumerate()
            .map(|(i, content)| {
                let mut file = FileRecord::new(format!("src/f{}.py", i), 100);
                if let Some(c) = content {
                    file = file.with_content(*c);
                }
                PrioritizedFile {
                    file,
                    score: 100 - i as i64,
                    rank: i + 1,
                }
            })
            .collect()
    }

    fn distinct(n: usize) -> Vec<PrioritizedFile> {
        let bodies: Vec<String> = (0..n).map(|i| format!("x = {}", i)).collect();
        let refs: Vec<Option<&str>> = bodies.iter().map(|b| Some(b.as_str())).collect();
        ranked(&refs)
    }

    async fn run(
        service: Arc<MockService>,
        files: &[PrioritizedFile],
        config: ExplanationConfig,
    ) -> BTreeMap<String, ExplanationRecord> {
        ExplanationOrchestrator::new(service, config)
            .explain(files, CancellationToken::new())
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_selected_path_gets_one_record() {
        let service = Arc::new(MockService::new(Behavior::Respond(VALID)));
        let files = ranked(&[Some("a = 1"), None, Some("b = 2"), Some("c = 3"), Some("d = 4")]);

        let records = run(service.clone(), &files, config(4, 2)).await;

        assert_eq!(records.len(), 4);
        assert!(!records.contains_key("src/f4.py"));
        assert_eq!(
            records["src/f1.py"],
            ExplanationRecord::unsubmitted(ExplanationResult::failed(ErrorKind::Malformed, 0))
        );
        for path in ["src/f0.py", "src/f2.py", "src/f3.py"] {
            assert!(records[path].result.is_success(), "{}", path);
            assert!(records[path].fingerprint.is_some());
        }
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_ceiling() {
        // (K, limit)
        for (k, limit) in [(8, 3), (5, 1), (2, 4), (6, 6), (1, 1)] {
            let service = Arc::new(MockService::new(Behavior::Respond(VALID)));
            let files = distinct(k);

            let records = run(service.clone(), &files, config(k, limit)).await;

            assert_eq!(records.len(), k, "k={} limit={}", k, limit);
            assert_eq!(service.calls(), k, "k={} limit={}", k, limit);
            assert_eq!(
                service.max_in_flight.load(Ordering::SeqCst),
                k.min(limit),
                "k={} limit={}",
                k,
                limit
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_text_submitted_once() {
        let service = Arc::new(MockService::new(Behavior::Respond(VALID)));
        let same = "def f():\n    return 1\n";
        let files = ranked(&[Some(same), Some(same), Some(same), Some("other = 2"), Some("x = 3")]);

        let records = run(service.clone(), &files, config(5, 3)).await;

        assert_eq!(service.calls(), 3);
        assert_eq!(records["src/f0.py"], records["src/f1.py"]);
        assert_eq!(records["src/f0.py"], records["src/f2.py"]);
        assert_ne!(records["src/f0.py"].fingerprint, records["src/f3.py"].fingerprint);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_service_times_out_after_retries() {
        let service = Arc::new(MockService::new(Behavior::Hang));
        let files = distinct(1);

        let records = run(service.clone(), &files, config(1, 1)).await;

        assert_eq!(
            records["src/f0.py"].result,
            ExplanationResult::failed(ErrorKind::Timeout, 3)
        );
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_not_retried() {
        let service = Arc::new(MockService::new(Behavior::Fail(ServiceError::Authentication(
            "bad key".into(),
        ))));
        let records = run(service.clone(), &distinct(2), config(2, 2)).await;

        for record in records.values() {
            assert_eq!(record.result, ExplanationResult::failed(ErrorKind::Auth, 1));
        }
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_text_response_is_degraded() {
        let service = Arc::new(MockService::new(Behavior::Respond(
            "This file defines a helper.\nIt is small.",
        )));
        let records = run(service, &distinct(1), config(1, 1)).await;

        match &records["src/f0.py"].result {
            ExplanationResult::Degraded { partial, .. } => {
                assert_eq!(partial.summary.as_deref(), Some("This file defines a helper."));
            }
            other => panic!("expected degraded, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_content_truncated_before_submission() {
        let service = Arc::new(MockService::new(Behavior::Respond(VALID)));
        let files = ranked(&[Some("abcdefghijklmnopqrstuvwxy")]);
        let cfg = ExplanationConfig {
            max_code_length: 10,
            ..config(1, 1)
        };

        let records = run(service.clone(), &files, cfg).await;

        let truncation = records["src/f0.py"].truncation.unwrap();
        assert_eq!(truncation.original_chars, 25);
        assert_eq!(truncation.submitted_chars, 10);
        assert_eq!(service.codes.lock().unwrap().as_slice(), ["abcdefghij"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_request_keeps_each_files_truncation() {
        let service = Arc::new(MockService::new(Behavior::Respond(VALID)));
        let files = ranked(&[Some("0123456789"), Some("0123456789abcdefghijklmno")]);
        let cfg = ExplanationConfig {
            max_code_length: 10,
            ..config(2, 2)
        };

        let records = run(service.clone(), &files, cfg).await;

        assert_eq!(service.calls(), 1);
        assert_eq!(records["src/f0.py"].fingerprint, records["src/f1.py"].fingerprint);
        assert_eq!(records["src/f0.py"].truncation, None);
        assert_eq!(
            records["src/f1.py"].truncation,
            Some(Truncation {
                original_chars: 25,
                submitted_chars: 10
            })
        );
        assert!(records["src/f1.py"].result.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let service = Arc::new(MockService::new(Behavior::Respond(VALID)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let records = ExplanationOrchestrator::new(service.clone(), config(3, 1))
            .explain(&distinct(3), cancel)
            .await;

        assert_eq!(records.len(), 3);
        assert!(records
            .values()
            .all(|r| r.result == ExplanationResult::cancelled()));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_flight_settles_everything() {
        let service = Arc::new(
            MockService::new(Behavior::Respond(VALID)).with_delay(Duration::from_secs(3)),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let records = ExplanationOrchestrator::new(service.clone(), config(4, 2))
            .explain(&distinct(4), cancel)
            .await;

        assert_eq!(records.len(), 4);
        assert!(records
            .values()
            .all(|r| r.result == ExplanationResult::cancelled()));
        assert_eq!(service.calls(), 2);
    }
}
