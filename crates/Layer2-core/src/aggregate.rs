//! Aggregator - 단계별 결과를 Summary로 병합
//!
//! Pure merge plus counting. Every file in the explanation selection must
//! have exactly one record; anything else is a contract violation, not a
//! partial summary.

use crate::dependencies::DependencyReport;
use crate::insights::{self, CodeInsights};
use crate::profile::ProjectProfile;
use crate::structure::StructureReport;
use lens_foundation::{
    Error, ExplanationRecord, ExplanationResult, MetricsSnapshot, PatternFinding,
    PrioritizedFile, Result, RunMetadata,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A selected file and its explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainedFile {
    pub file: PrioritizedFile,
    pub record: ExplanationRecord,
}

/// Outcome counts over the selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub selected: usize,
    pub succeeded: usize,
    pub degraded: usize,
    pub failed: usize,
    /// Failure kind → count
    pub failures: BTreeMap<String, usize>,
}

impl Coverage {
    fn count<'a>(records: impl IntoIterator<Item = &'a ExplanationRecord>) -> Self {
        let mut coverage = Self::default();
        for record in records {
            coverage.selected += 1;
            match &record.result {
                ExplanationResult::Success(_) => coverage.succeeded += 1,
                ExplanationResult::Degraded { .. } => coverage.degraded += 1,
                ExplanationResult::Failed { kind, .. } => {
                    coverage.failed += 1;
                    *coverage.failures.entry(kind.to_string()).or_default() += 1;
                }
            }
        }
        coverage
    }
}

/// Repository-wide reports computed alongside explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reports {
    pub metrics: MetricsSnapshot,
    pub patterns: Vec<PatternFinding>,
    pub structure: StructureReport,
    pub dependencies: DependencyReport,
    pub profile: ProjectProfile,
}

/// 분석 결과 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub metadata: RunMetadata,
    /// `metrics.largest_files` is ordered by line count; see `ranking` for priority
    pub metrics: MetricsSnapshot,
    pub patterns: Vec<PatternFinding>,
    pub structure: StructureReport,
    pub dependencies: DependencyReport,
    pub profile: ProjectProfile,
    /// Every analyzed file in priority order
    pub ranking: Vec<PrioritizedFile>,
    /// The explanation selection in priority order
    pub explanations: Vec<ExplainedFile>,
    pub coverage: Coverage,
    pub insights: CodeInsights,
}

/// Merge stage outputs.
///
/// `explain_limit` is the K used for selection; the first
/// `min(K, ranking.len())` files must each have a record, and no other path
/// may.
pub fn aggregate(
    reports: Reports,
    ranking: Vec<PrioritizedFile>,
    mut records: BTreeMap<String, ExplanationRecord>,
    explain_limit: usize,
    mut metadata: RunMetadata,
) -> Result<Summary> {
    let selected = explain_limit.min(ranking.len());

    let mut explanations = Vec::with_capacity(selected);
    for file in &ranking[..selected] {
        let record = records.remove(file.path()).ok_or_else(|| {
            Error::contract(format!("selected file '{}' has no explanation", file.path()))
        })?;
        explanations.push(ExplainedFile {
            file: file.clone(),
            record,
        });
    }
    if let Some(extra) = records.keys().next() {
        return Err(Error::contract(format!(
            "explanation for unselected file '{}'",
            extra
        )));
    }

    let unique_requests: BTreeSet<&str> = explanations
        .iter()
        .filter_map(|e| e.record.fingerprint.as_deref())
        .collect();
    metadata.analyzed_files = ranking.len();
    metadata.explained_files = selected;
    metadata.explanation_requests = unique_requests.len();

    let coverage = Coverage::count(explanations.iter().map(|e| &e.record));
    let insights = insights::derive(explanations.iter().map(|e| &e.record));

    Ok(Summary {
        metadata,
        metrics: reports.metrics,
        patterns: reports.patterns,
        structure: reports.structure,
        dependencies: reports.dependencies,
        profile: reports.profile,
        ranking,
        explanations,
        coverage,
        insights,
    })
}
