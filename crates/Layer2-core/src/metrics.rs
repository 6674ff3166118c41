//! Metrics Engine - 라인 수 / 주석 / 중첩 깊이 측정
//!
//! Each file is measured independently into a one-file snapshot, then the
//! snapshots are folded with `MetricsSnapshot::merge` on the rayon pool.
//! Merge is associative and commutative, so the fold order never shows up in
//! the result.

use lens_foundation::{
    language::{self, CommentSyntax, LanguageSpec, NestingStyle},
    FileRecord, FlaggedFile, LineStats, MetricsConfig, MetricsSnapshot, UNKNOWN_LANGUAGE,
};
use rayon::prelude::*;
use tracing::debug;

/// Measurements of a single file with content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetrics {
    pub path: String,
    pub language: String,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub max_depth: usize,
    /// Comment syntax known for the language
    pub classified: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LineCounts {
    total: usize,
    code: usize,
    comment: usize,
    blank: usize,
}

/// Language spec from the record's tag, falling back to the path
fn spec_for(file: &FileRecord) -> Option<&'static LanguageSpec> {
    file.language
        .as_deref()
        .and_then(language::by_name)
        .or_else(|| language::detect(&file.path))
}

/// Measure one file; `None` when content is absent
pub fn measure_file(file: &FileRecord) -> Option<FileMetrics> {
    let content = file.content.as_deref()?;
    let spec = spec_for(file);
    let comments = spec.and_then(|s| s.comments.as_ref());
    let counts = count_lines(content, comments);

    Some(FileMetrics {
        path: file.path.clone(),
        language: language_tag(file, spec),
        total_lines: counts.total,
        code_lines: counts.code,
        comment_lines: counts.comment,
        blank_lines: counts.blank,
        max_depth: nesting_depth(content, spec),
        classified: comments.is_some(),
    })
}

fn language_tag(file: &FileRecord, spec: Option<&'static LanguageSpec>) -> String {
    spec.map(|s| s.name.to_string())
        .or_else(|| file.language.clone())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

/// One-file snapshot
pub fn snapshot_file(file: &FileRecord, config: &MetricsConfig) -> MetricsSnapshot {
    let mut snapshot = MetricsSnapshot::empty(config.largest_files_count);

    let Some(m) = measure_file(file) else {
        // 내용 없음: 파일 수와 바이트만 집계
        let stats = LineStats {
            files: 1,
            bytes: file.size,
            ..Default::default()
        };
        snapshot
            .languages
            .insert(language_tag(file, spec_for(file)), stats);
        snapshot.totals = stats;
        return snapshot;
    };

    let stats = LineStats {
        files: 1,
        total_lines: m.total_lines,
        code_lines: m.code_lines,
        comment_lines: m.comment_lines,
        blank_lines: m.blank_lines,
        bytes: file.size,
    };
    snapshot.languages.insert(m.language.clone(), stats);
    snapshot.totals = stats;
    snapshot.max_nesting_depth = m.max_depth;
    if !m.classified {
        snapshot.unclassified_files = 1;
    }

    if m.total_lines > config.large_file_lines {
        snapshot.large_files.push(FlaggedFile {
            path: m.path.clone(),
            value: m.total_lines,
        });
    }
    if m.max_depth > config.deep_nesting_depth {
        snapshot.deeply_nested_files.push(FlaggedFile {
            path: m.path.clone(),
            value: m.max_depth,
        });
    }
    if config.largest_files_count > 0 {
        snapshot.largest_files.push(FlaggedFile {
            path: m.path,
            value: m.total_lines,
        });
    }

    snapshot
}

/// Compute the snapshot over all files
pub fn compute<F>(files: &[F], config: &MetricsConfig) -> MetricsSnapshot
where
    F: AsRef<FileRecord> + Sync,
{
    let snapshot = files
        .par_iter()
        .map(|f| snapshot_file(f.as_ref(), config))
        .reduce(
            || MetricsSnapshot::empty(config.largest_files_count),
            MetricsSnapshot::merge,
        );

    debug!(
        "Metrics: {} files, {} lines, {} large, {} deeply nested",
        snapshot.totals.files,
        snapshot.totals.total_lines,
        snapshot.large_files.len(),
        snapshot.deeply_nested_files.len()
    );
    snapshot
}

// ============================================================================
// Line classification
// ============================================================================

fn count_lines(content: &str, comments: Option<&CommentSyntax>) -> LineCounts {
    let mut counts = LineCounts::default();
    // 열린 블록 주석의 닫는 토큰
    let mut open_block: Option<&str> = None;

    for line in content.lines() {
        counts.total += 1;
        let t = line.trim();

        if t.is_empty() {
            counts.blank += 1;
            continue;
        }

        let Some(syntax) = comments else {
            counts.code += 1;
            continue;
        };

        if let Some(close) = open_block {
            counts.comment += 1;
            if t.contains(close) {
                open_block = None;
            }
            continue;
        }

        if syntax.line.iter().any(|p| t.starts_with(p)) {
            counts.comment += 1;
            continue;
        }

        if let Some((open, close)) = syntax.block.iter().find(|(open, _)| t.starts_with(open)) {
            counts.comment += 1;
            if !t[open.len()..].contains(close) {
                open_block = Some(*close);
            }
            continue;
        }

        counts.code += 1;
    }

    counts
}

// ============================================================================
// Nesting depth
// ============================================================================

fn nesting_depth(content: &str, spec: Option<&LanguageSpec>) -> usize {
    match spec.map(|s| s.nesting) {
        Some(NestingStyle::Braces) => {
            let line_prefixes = spec
                .and_then(|s| s.comments.as_ref())
                .map(|c| c.line)
                .unwrap_or(&[]);
            brace_depth(content, line_prefixes)
        }
        Some(NestingStyle::Indentation) => {
            let fallback = if spec.is_some_and(|s| s.name == "Python") { 4 } else { 2 };
            indent_depth(content, indent_unit(content).unwrap_or(fallback))
        }
        None => indent_depth(content, indent_unit(content).unwrap_or(2)),
    }
}

/// Max `{` depth, ignoring comment lines and double-quoted / template strings
fn brace_depth(content: &str, line_comments: &[&str]) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;

    for line in content.lines() {
        let t = line.trim_start();
        if line_comments.iter().any(|p| t.starts_with(p)) {
            continue;
        }

        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in t.chars() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '`' => quote = Some(c),
                '{' => {
                    depth += 1;
                    max = max.max(depth);
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    max
}

/// Smallest non-zero run of leading spaces, if any line is space-indented
fn indent_unit(content: &str) -> Option<usize> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| *c == ' ').count())
        .filter(|&n| n > 0)
        .min()
}

/// Max leading indentation divided by `unit` (tabs count as one unit)
fn indent_depth(content: &str, unit: usize) -> usize {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let width: usize = line
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .map(|c| if c == '\t' { unit } else { 1 })
                .sum();
            width / unit
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MetricsConfig {
        MetricsConfig::default()
    }

    /// 520 lines, deepest block 8 levels of 4-space indentation
    fn deep_python() -> String {
        let mut lines = Vec::new();
        for level in 0..8 {
            lines.push(format!("{}if x > {}:", "    ".repeat(level), level));
        }
        lines.push(format!("{}pass", "    ".repeat(8)));
        while lines.len() < 520 {
            lines.push("y = 1".to_string());
        }
        lines.join("\n")
    }

    #[test]
    fn test_indent_unit_inferred_from_file() {
        let two = "a:\n  b:\n    c:\n      d\n";
        assert_eq!(indent_unit(two), Some(2));
        assert_eq!(indent_depth(two, 2), 3);
        assert_eq!(indent_unit("x = 1\n"), None);

        let spec = language::detect("a.py");
        assert_eq!(nesting_depth(two, spec), 3);
    }

    #[test]
    fn test_large_and_deep_file_flagged_in_both_lists() {
        let file = FileRecord::new("pkg/deep.py", 4000).with_content(deep_python());
        let snapshot = compute(&[file], &config());

        assert_eq!(snapshot.large_files.len(), 1);
        assert_eq!(snapshot.large_files[0].path, "pkg/deep.py");
        assert_eq!(snapshot.large_files[0].value, 520);
        assert_eq!(snapshot.deeply_nested_files.len(), 1);
        assert_eq!(snapshot.deeply_nested_files[0].value, 8);
    }

    #[test]
    fn test_comment_and_blank_counts() {
        let rust = "// header\n/* block\n still */\nfn main() {\n\n    let x = \"{\"; // trailing\n}\n";
        let file = FileRecord::new("src/main.rs", 80).with_content(rust);
        let m = measure_file(&file).unwrap();

        assert_eq!(m.total_lines, 7);
        assert_eq!(m.comment_lines, 3);
        assert_eq!(m.blank_lines, 1);
        assert_eq!(m.code_lines, 3);
        assert_eq!(m.max_depth, 1);
        assert!(m.classified);
    }

    #[test]
    fn test_python_docstring_is_comment() {
        let py = "\"\"\"Module doc\nmore\n\"\"\"\nimport os\n# note\n";
        let file = FileRecord::new("a.py", 40).with_content(py);
        let m = measure_file(&file).unwrap();
        assert_eq!(m.comment_lines, 4);
        assert_eq!(m.code_lines, 1);
    }

    #[test]
    fn test_unregistered_comment_syntax_not_attributed() {
        let json = "{\n  // not a comment in JSON\n\n  \"a\": 1\n}\n";
        let file = FileRecord::new("data.json", 30).with_content(json);
        let snapshot = snapshot_file(&file, &config());

        let stats = snapshot.languages["JSON"];
        assert_eq!(stats.total_lines, 5);
        assert_eq!(stats.blank_lines, 1);
        assert_eq!(stats.comment_lines, 0);
        assert_eq!(snapshot.unclassified_files, 1);
    }

    #[test]
    fn test_files_without_content_count_but_have_no_lines() {
        let file = FileRecord::new("bin/tool", 1234);
        let snapshot = snapshot_file(&file, &config());
        assert_eq!(snapshot.totals.files, 1);
        assert_eq!(snapshot.totals.bytes, 1234);
        assert_eq!(snapshot.totals.total_lines, 0);
        assert!(snapshot.languages.contains_key(UNKNOWN_LANGUAGE));
    }

    #[test]
    fn test_partitioned_merge_equals_full_compute() {
        let files: Vec<FileRecord> = (0..40)
            .map(|i| {
                let body = "fn f() {\n    if a { b(); }\n}\n// c\n\n".repeat(i % 7 + 1);
                let ext = if i % 3 == 0 { "py" } else { "rs" };
                FileRecord::new(format!("src/f{:02}.{}", i, ext), 100).with_content(body)
            })
            .collect();

        let cfg = MetricsConfig {
            large_file_lines: 20,
            largest_files_count: 5,
            ..Default::default()
        };
        let full = compute(&files, &cfg);
        let (left, right) = files.split_at(17);
        let merged = compute(left, &cfg).merge(compute(right, &cfg));

        assert_eq!(full, merged);
        assert_eq!(full.totals.files, 40);
        assert_eq!(full.largest_files.len(), 5);
    }
}
