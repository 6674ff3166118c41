//! Structure Report - 디렉터리 / 확장자 / 파일 분류 통계

use lens_foundation::{language, FileRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directory key for files at the repository root
pub const ROOT_DIR: &str = "root";
/// Extension key for files without one
pub const NO_EXTENSION: &str = "no_extension";

/// Paths grouped by role; a file may appear in several groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCategories {
    pub config: Vec<String>,
    pub documentation: Vec<String>,
    pub test: Vec<String>,
    pub build: Vec<String>,
    pub source: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureReport {
    pub total_files: usize,
    pub total_bytes: u64,
    /// extension → file count
    pub extensions: BTreeMap<String, usize>,
    /// parent directory → file count
    pub directories: BTreeMap<String, usize>,
    /// directory depth → file count
    pub depth_histogram: BTreeMap<usize, usize>,
    pub max_depth: usize,
    pub categories: FileCategories,
}

const CONFIG_NAMES: &[&str] = &[
    "package.json",
    "cargo.toml",
    "pyproject.toml",
    "setup.cfg",
    "tsconfig.json",
    "webpack.config.js",
    "vite.config.ts",
    "vite.config.js",
    ".env",
    ".env.example",
    ".editorconfig",
    ".gitignore",
];
const CONFIG_EXTENSIONS: &[&str] = &["toml", "ini", "cfg", "conf", "yaml", "yml"];

const DOC_NAMES: &[&str] = &["readme", "changelog", "license", "contributing", "authors"];
const DOC_EXTENSIONS: &[&str] = &["md", "rst", "adoc", "txt"];

const BUILD_NAMES: &[&str] = &[
    "makefile",
    "cmakelists.txt",
    "dockerfile",
    "build.gradle",
    "build.gradle.kts",
    "pom.xml",
    "build.rs",
    "build.sh",
    "justfile",
    "setup.py",
];

fn is_config(name: &str, ext: &str) -> bool {
    CONFIG_NAMES.contains(&name) || CONFIG_EXTENSIONS.contains(&ext) || name.contains("config")
}

fn is_documentation(name: &str, ext: &str, dirs: &[String]) -> bool {
    DOC_EXTENSIONS.contains(&ext)
        || DOC_NAMES.iter().any(|d| name.starts_with(d))
        || dirs.first().is_some_and(|d| d == "docs" || d == "doc")
}

fn is_test(name: &str, dirs: &[String]) -> bool {
    name.starts_with("test_")
        || name.contains("_test.")
        || name.contains(".test.")
        || name.contains(".spec.")
        || dirs
            .iter()
            .any(|d| matches!(d.as_str(), "test" | "tests" | "__tests__" | "spec"))
}

fn is_build(name: &str) -> bool {
    BUILD_NAMES.contains(&name)
}

/// Summarise the layout of the analyzed files
pub fn analyze<F: AsRef<FileRecord>>(files: &[F]) -> StructureReport {
    let mut report = StructureReport::default();

    for file in files.iter().map(AsRef::as_ref) {
        report.total_files += 1;
        report.total_bytes += file.size;

        let ext = file.extension().unwrap_or_default();
        let ext_key = if ext.is_empty() {
            NO_EXTENSION.to_string()
        } else {
            ext.clone()
        };
        *report.extensions.entry(ext_key).or_default() += 1;

        let dirs: Vec<String> = file.dir_segments().map(str::to_lowercase).collect();
        let parent = if dirs.is_empty() {
            ROOT_DIR.to_string()
        } else {
            file.dir_segments().collect::<Vec<_>>().join("/")
        };
        *report.directories.entry(parent).or_default() += 1;

        let depth = dirs.len();
        *report.depth_histogram.entry(depth).or_default() += 1;
        report.max_depth = report.max_depth.max(depth);

        let name = file.file_name().to_lowercase();
        let path = file.path.clone();
        let categories = &mut report.categories;
        if is_config(&name, &ext) {
            categories.config.push(path.clone());
        }
        if is_documentation(&name, &ext, &dirs) {
            categories.documentation.push(path.clone());
        }
        if is_test(&name, &dirs) {
            categories.test.push(path.clone());
        }
        if is_build(&name) {
            categories.build.push(path.clone());
        }
        if language::detect(&file.path).is_some_and(|l| l.is_code) {
            categories.source.push(path);
        }
    }

    let categories = &mut report.categories;
    for list in [
        &mut categories.config,
        &mut categories.documentation,
        &mut categories.test,
        &mut categories.build,
        &mut categories.source,
    ] {
        list.sort();
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_counts() {
        let files = vec![
            FileRecord::new("README.md", 100),
            FileRecord::new("Makefile", 20),
            FileRecord::new("src/main.rs", 300),
            FileRecord::new("src/util/mod.rs", 50),
            FileRecord::new("tests/test_api.py", 80),
            FileRecord::new("config/app.yaml", 10),
        ];
        let report = analyze(&files);

        assert_eq!(report.total_files, 6);
        assert_eq!(report.total_bytes, 560);
        assert_eq!(report.extensions["rs"], 2);
        assert_eq!(report.extensions[NO_EXTENSION], 1);
        assert_eq!(report.directories[ROOT_DIR], 2);
        assert_eq!(report.directories["src/util"], 1);
        assert_eq!(report.depth_histogram[&0], 2);
        assert_eq!(report.depth_histogram[&1], 3);
        assert_eq!(report.max_depth, 2);

        let c = &report.categories;
        assert_eq!(c.build, vec!["Makefile"]);
        assert_eq!(c.test, vec!["tests/test_api.py"]);
        assert_eq!(c.config, vec!["config/app.yaml"]);
        assert_eq!(c.documentation, vec!["README.md"]);
        assert_eq!(
            c.source,
            vec!["src/main.rs", "src/util/mod.rs", "tests/test_api.py"]
        );
    }

    #[test]
    fn test_empty_input() {
        let report = analyze::<FileRecord>(&[]);
        assert_eq!(report, StructureReport::default());
    }
}
