//! File Ranker - 파일 중요도 랭킹
//!
//! 휴리스틱 가산 점수로 파일 순위를 매깁니다. 이 순위는 시스템의 유일한
//! 랭킹이며 metrics(largest files)와 explanation(top-K)이 그대로 사용합니다.
//!
//! Ordering: score descending, then path ascending. Paths are unique in a
//! snapshot, so the order is total and identical input yields identical ranks.

use lens_foundation::{language, FileRecord, PrioritizedFile, PriorityWeights};
use std::cmp::Ordering;
use tracing::debug;

/// Manifests, entry docs and build descriptors
const IMPORTANT_FILES: &[&str] = &[
    "readme.md",
    "readme.rst",
    "readme.txt",
    "readme",
    "package.json",
    "cargo.toml",
    "pyproject.toml",
    "setup.py",
    "requirements.txt",
    "pipfile",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "gemfile",
    "composer.json",
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "makefile",
];

/// 진입점 파일
const ENTRY_POINTS: &[&str] = &[
    "main.rs",
    "lib.rs",
    "main.py",
    "app.py",
    "__main__.py",
    "manage.py",
    "index.js",
    "index.ts",
    "index.tsx",
    "app.js",
    "app.ts",
    "server.js",
    "server.ts",
    "main.go",
    "main.java",
    "application.java",
    "program.cs",
    "main.cpp",
    "main.c",
];

const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml", "ini", "cfg", "conf", "env"];
const CONFIG_MARKERS: &[&str] = &["config", "settings", ".env"];

const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt", "adoc"];

/// Conventional source roots
const SIGNIFICANT_DIRS: &[&str] = &[
    "src", "lib", "app", "core", "pkg", "cmd", "internal", "server", "api", "main",
];

/// Tests, examples, vendored assets
const AUXILIARY_DIRS: &[&str] = &[
    "test",
    "tests",
    "__tests__",
    "spec",
    "specs",
    "testing",
    "example",
    "examples",
    "samples",
    "fixtures",
    "mocks",
    "benches",
    "assets",
    "static",
    "public",
    "third_party",
    "vendor",
];

/// 파일 랭커
pub struct FileRanker<'a> {
    weights: &'a PriorityWeights,
}

impl<'a> FileRanker<'a> {
    pub fn new(weights: &'a PriorityWeights) -> Self {
        Self { weights }
    }

    /// Additive heuristic score (higher wins)
    pub fn score(&self, file: &FileRecord) -> i64 {
        let w = self.weights;
        let name = file.file_name().to_lowercase();
        let ext = file.extension();
        let ext = ext.as_deref().unwrap_or("");
        let mut score = 0;

        // 1. 핵심 파일 이름
        if IMPORTANT_FILES.contains(&name.as_str()) {
            score += w.important_name;
        }
        if ENTRY_POINTS.contains(&name.as_str()) {
            score += w.entry_point;
        }

        // 2. 파일 종류
        if CONFIG_EXTENSIONS.contains(&ext) || CONFIG_MARKERS.iter().any(|m| name.contains(m)) {
            score += w.config_file;
        }
        if language::detect(&file.path).is_some_and(|l| l.is_code) {
            score += w.source_extension;
        }
        if DOC_EXTENSIONS.contains(&ext) {
            score += w.documentation;
        }

        // 3. 위치
        let dirs: Vec<String> = file.dir_segments().map(str::to_lowercase).collect();
        if dirs.is_empty() {
            score += w.root_level;
        }
        if dirs
            .first()
            .is_some_and(|d| SIGNIFICANT_DIRS.contains(&d.as_str()))
        {
            score += w.significant_dir;
        }
        if dirs.iter().any(|d| AUXILIARY_DIRS.contains(&d.as_str())) || is_test_name(&name) {
            score += w.auxiliary_dir;
        }

        // 4. 크기 (작은 가산점)
        if (w.mid_size_min..=w.mid_size_max).contains(&file.size) {
            score += w.mid_size;
        }

        score
    }

    /// Score and order files; ranks are 1-based
    pub fn rank(&self, files: Vec<FileRecord>) -> Vec<PrioritizedFile> {
        let mut scored: Vec<(i64, FileRecord)> =
            files.into_iter().map(|f| (self.score(&f), f)).collect();

        scored.sort_by(|(sa, fa), (sb, fb)| compare(*sa, &fa.path, *sb, &fb.path));

        let ranked: Vec<PrioritizedFile> = scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, file))| PrioritizedFile {
                file,
                score,
                rank: i + 1,
            })
            .collect();

        if let Some(top) = ranked.first() {
            debug!("Top ranked: {} (score {})", top.file.path, top.score);
        }
        ranked
    }
}

/// Score descending, path ascending
fn compare(score_a: i64, path_a: &str, score_b: i64, path_b: &str) -> Ordering {
    score_b.cmp(&score_a).then_with(|| path_a.cmp(path_b))
}

fn is_test_name(name: &str) -> bool {
    name.starts_with("test_")
        || name.contains("_test.")
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.ends_with("_test")
}

/// Rank with the given weights
pub fn prioritize(files: Vec<FileRecord>, weights: &PriorityWeights) -> Vec<PrioritizedFile> {
    FileRanker::new(weights).rank(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FileRecord> {
        vec![
            FileRecord::new("tests/test_api.py", 2000),
            FileRecord::new("src/app/models.py", 4000),
            FileRecord::new("README.md", 3000),
            FileRecord::new("examples/demo.py", 2000),
            FileRecord::new("src/main.py", 1500),
            FileRecord::new("a.py", 10),
            FileRecord::new("b.py", 10),
            FileRecord::new("setup.cfg", 200),
        ]
    }

    #[test]
    fn test_important_and_source_dirs_outrank_auxiliary() {
        let ranked = prioritize(sample(), &PriorityWeights::default());
        let order: Vec<&str> = ranked.iter().map(|p| p.path()).collect();

        let pos = |p: &str| order.iter().position(|x| *x == p).unwrap();
        assert_eq!(order[0], "README.md");
        assert!(pos("src/main.py") < pos("src/app/models.py"));
        assert!(pos("src/app/models.py") < pos("tests/test_api.py"));
        assert!(pos("src/app/models.py") < pos("examples/demo.py"));
    }

    #[test]
    fn test_ties_broken_by_path() {
        let ranked = prioritize(sample(), &PriorityWeights::default());
        let a = ranked.iter().find(|p| p.path() == "a.py").unwrap();
        let b = ranked.iter().find(|p| p.path() == "b.py").unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.rank + 1, b.rank);
    }

    #[test]
    fn test_ranking_is_total_and_deterministic() {
        let weights = PriorityWeights::default();
        let first = prioritize(sample(), &weights);

        let mut reversed = sample();
        reversed.reverse();
        let second = prioritize(reversed, &weights);

        assert_eq!(first, second);
        for (i, pair) in first.windows(2).enumerate() {
            let ord = compare(pair[0].score, pair[0].path(), pair[1].score, pair[1].path());
            assert_eq!(ord, Ordering::Less, "pair {} not strictly ordered", i);
            assert_eq!(pair[0].rank, i + 1);
        }
    }

    #[test]
    fn test_weights_are_configurable() {
        let weights = PriorityWeights {
            auxiliary_dir: 500,
            ..Default::default()
        };
        let ranked = prioritize(sample(), &weights);
        assert_eq!(ranked[0].path(), "examples/demo.py");
        assert_eq!(ranked[1].path(), "tests/test_api.py");
    }
}
