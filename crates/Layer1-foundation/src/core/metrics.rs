//! Metrics Snapshot - 라인/복잡도 집계 결과
//!
//! `merge` is associative and commutative: sums for counters, key-wise merge
//! for the language map, sorted lists for flagged files. The engine can fold
//! per-file snapshots in any order and get the same value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Line counts for one language (or the global total)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub files: usize,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub bytes: u64,
}

impl LineStats {
    pub fn merge(&mut self, other: &LineStats) {
        self.files += other.files;
        self.total_lines += other.total_lines;
        self.code_lines += other.code_lines;
        self.comment_lines += other.comment_lines;
        self.blank_lines += other.blank_lines;
        self.bytes += other.bytes;
    }
}

/// A file flagged with the value that triggered the flag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlaggedFile {
    pub path: String,
    pub value: usize,
}

/// Language tag used for files without a detected language
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub languages: BTreeMap<String, LineStats>,
    pub totals: LineStats,
    /// Files whose comment syntax is not registered; comment lines are not attributed
    pub unclassified_files: usize,
    /// `value` = line count, sorted by path
    pub large_files: Vec<FlaggedFile>,
    /// `value` = max nesting depth, sorted by path
    pub deeply_nested_files: Vec<FlaggedFile>,
    /// Size report, not a ranking: `value` = line count, most lines first,
    /// ties by path. Priority order lives only in `Summary::ranking`.
    pub largest_files: Vec<FlaggedFile>,
    /// Capacity of `largest_files`
    pub largest_limit: usize,
    /// Deepest nesting seen in any file
    pub max_nesting_depth: usize,
}

impl MetricsSnapshot {
    pub fn empty(largest_limit: usize) -> Self {
        Self {
            largest_limit,
            ..Default::default()
        }
    }

    pub fn merge(mut self, other: MetricsSnapshot) -> MetricsSnapshot {
        for (lang, stats) in &other.languages {
            self.languages.entry(lang.clone()).or_default().merge(stats);
        }
        self.totals.merge(&other.totals);
        self.unclassified_files += other.unclassified_files;
        self.max_nesting_depth = self.max_nesting_depth.max(other.max_nesting_depth);

        self.large_files.extend(other.large_files);
        self.large_files.sort();

        self.deeply_nested_files.extend(other.deeply_nested_files);
        self.deeply_nested_files.sort();

        self.largest_limit = self.largest_limit.max(other.largest_limit);
        self.largest_files.extend(other.largest_files);
        self.largest_files
            .sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.path.cmp(&b.path)));
        self.largest_files.truncate(self.largest_limit);

        self
    }

    /// Average lines per file with content
    pub fn average_lines(&self) -> f64 {
        if self.totals.files == 0 {
            0.0
        } else {
            self.totals.total_lines as f64 / self.totals.files as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lang: &str, path: &str, lines: usize, depth: usize) -> MetricsSnapshot {
        let stats = LineStats {
            files: 1,
            total_lines: lines,
            code_lines: lines,
            ..Default::default()
        };
        let mut s = MetricsSnapshot::empty(2);
        s.languages.insert(lang.to_string(), stats);
        s.totals = stats;
        s.max_nesting_depth = depth;
        s.largest_files.push(FlaggedFile {
            path: path.to_string(),
            value: lines,
        });
        if depth > 6 {
            s.deeply_nested_files.push(FlaggedFile {
                path: path.to_string(),
                value: depth,
            });
        }
        s
    }

    #[test]
    fn test_merge_is_associative_and_commutative() {
        let a = snapshot("Rust", "a.rs", 10, 2);
        let b = snapshot("Python", "b.py", 30, 8);
        let c = snapshot("Rust", "c.rs", 30, 7);

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.clone().merge(b.clone().merge(c.clone()));
        let shuffled = c.merge(a).merge(b);

        assert_eq!(left, right);
        assert_eq!(left, shuffled);
        assert_eq!(left.languages["Rust"].files, 2);
        assert_eq!(left.totals.total_lines, 70);
        assert_eq!(left.max_nesting_depth, 8);
        assert_eq!(
            left.largest_files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            vec!["b.py", "c.rs"]
        );
        assert_eq!(left.deeply_nested_files.len(), 2);
    }
}
