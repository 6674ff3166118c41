//! Content Filter - 분석 대상 파일 선별
//!
//! A file is dropped when any rule rejects it; survivors keep their discovery
//! order and are truncated to `max_files_to_analyze`. Filtering an already
//! filtered list with the same config returns it unchanged.

use glob::Pattern;
use lens_foundation::{Error, FileRecord, FilterConfig, Result};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Why a file was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooLarge { size: u64, limit: u64 },
    ExcludedSegment(String),
    ExcludedGlob(String),
    ExcludedExtension(String),
    ExtensionNotAllowed,
    Hidden,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { size, limit } => write!(f, "size {} exceeds {}", size, limit),
            Self::ExcludedSegment(s) => write!(f, "excluded segment '{}'", s),
            Self::ExcludedGlob(g) => write!(f, "excluded glob '{}'", g),
            Self::ExcludedExtension(e) => write!(f, "excluded extension '{}'", e),
            Self::ExtensionNotAllowed => write!(f, "extension not allowed"),
            Self::Hidden => write!(f, "hidden file"),
        }
    }
}

/// Compiled form of a [`FilterConfig`]
pub struct ContentFilter {
    max_file_size: u64,
    max_files: usize,
    segments: HashSet<String>,
    globs: Vec<Pattern>,
    allowed: HashSet<String>,
    excluded_extensions: HashSet<String>,
    exclude_hidden: bool,
    hidden_allowlist: HashSet<String>,
}

impl ContentFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let globs = config
            .excluded_globs
            .iter()
            .map(|g| {
                Pattern::new(g)
                    .map_err(|e| Error::config(format!("invalid exclude glob '{}': {}", g, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            max_file_size: config.max_file_size,
            max_files: config.max_files_to_analyze,
            segments: config
                .excluded_segments
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            globs,
            allowed: normalize_extensions(&config.allowed_extensions),
            excluded_extensions: normalize_extensions(&config.excluded_extensions),
            exclude_hidden: config.exclude_hidden,
            hidden_allowlist: config.hidden_allowlist.iter().cloned().collect(),
        })
    }

    /// First rule that rejects the file, if any
    pub fn rejection(&self, file: &FileRecord) -> Option<Rejection> {
        if file.size > self.max_file_size {
            return Some(Rejection::TooLarge {
                size: file.size,
                limit: self.max_file_size,
            });
        }

        if let Some(segment) = file
            .path
            .split('/')
            .map(str::to_lowercase)
            .find(|s| self.segments.contains(s))
        {
            return Some(Rejection::ExcludedSegment(segment));
        }

        if let Some(glob) = self.globs.iter().find(|g| g.matches(&file.path)) {
            return Some(Rejection::ExcludedGlob(glob.as_str().to_string()));
        }

        let ext = file.extension();
        if let Some(ext) = ext.as_deref() {
            if self.excluded_extensions.contains(ext) {
                return Some(Rejection::ExcludedExtension(ext.to_string()));
            }
        }

        if !self.allowed.is_empty() && !ext.is_some_and(|e| self.allowed.contains(&e)) {
            return Some(Rejection::ExtensionNotAllowed);
        }

        let name = file.file_name();
        if self.exclude_hidden && name.starts_with('.') && !self.hidden_allowlist.contains(name) {
            return Some(Rejection::Hidden);
        }

        None
    }

    pub fn accepts(&self, file: &FileRecord) -> bool {
        self.rejection(file).is_none()
    }

    /// Keep eligible files in discovery order, then truncate
    pub fn apply(&self, files: Vec<FileRecord>) -> Vec<FileRecord> {
        let discovered = files.len();

        let kept: Vec<FileRecord> = files
            .into_iter()
            .filter(|file| match self.rejection(file) {
                Some(reason) => {
                    debug!("Skipping {}: {}", file.path, reason);
                    false
                }
                None => true,
            })
            .take(self.max_files)
            .collect();

        info!("Filter kept {} of {} files", kept.len(), discovered);
        kept
    }
}

/// Filter with a one-off compiled config
pub fn filter(files: Vec<FileRecord>, config: &FilterConfig) -> Result<Vec<FileRecord>> {
    Ok(ContentFilter::new(config)?.apply(files))
}

fn normalize_extensions(exts: &[String]) -> HashSet<String> {
    exts.iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    fn scenario_config() -> FilterConfig {
        FilterConfig {
            max_file_size: 1000,
            max_files_to_analyze: 2,
            excluded_segments: vec!["vendor".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_vendor_and_oversized_dropped() {
        let files = vec![
            FileRecord::new("README.md", 200),
            FileRecord::new("vendor/lib.js", 50),
            FileRecord::new("src/a.py", 900),
            FileRecord::new("src/b.py", 1200),
        ];

        let out = filter(files, &scenario_config()).unwrap();
        assert_eq!(paths(&out), vec!["README.md", "src/a.py"]);
    }

    #[test]
    fn test_truncation_keeps_discovery_order() {
        let files = vec![
            FileRecord::new("z.py", 1),
            FileRecord::new("a.py", 1),
            FileRecord::new("m.py", 1),
        ];

        let out = filter(files, &scenario_config()).unwrap();
        assert_eq!(paths(&out), vec!["z.py", "a.py"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let config = FilterConfig {
            max_files_to_analyze: 4,
            excluded_globs: vec!["**/*.min.js".to_string()],
            ..Default::default()
        };
        let files = vec![
            FileRecord::new("src/main.rs", 10),
            FileRecord::new("node_modules/x/index.js", 10),
            FileRecord::new("web/app.min.js", 10),
            FileRecord::new(".secret", 10),
            FileRecord::new(".gitignore", 10),
            FileRecord::new("logo.PNG", 10),
            FileRecord::new("lib/util.py", 10),
            FileRecord::new("docs/guide.md", 10),
            FileRecord::new("extra.txt", 10),
        ];

        let once = filter(files, &config).unwrap();
        let twice = filter(once.clone(), &config).unwrap();
        assert_eq!(once, twice);
        assert_eq!(
            paths(&once),
            vec!["src/main.rs", ".gitignore", "lib/util.py", "docs/guide.md"]
        );
    }

    #[test]
    fn test_segments_are_case_insensitive_components() {
        let filter = ContentFilter::new(&scenario_config()).unwrap();
        assert!(!filter.accepts(&FileRecord::new("Vendor/x.js", 1)));
        assert!(filter.accepts(&FileRecord::new("vendored/x.js", 1)));
        assert!(filter.accepts(&FileRecord::new("src/vendor.js", 1)));
    }

    #[test]
    fn test_allowed_extensions() {
        let config = FilterConfig {
            allowed_extensions: vec![".rs".to_string(), "PY".to_string()],
            ..Default::default()
        };
        let filter = ContentFilter::new(&config).unwrap();
        assert!(filter.accepts(&FileRecord::new("a.rs", 1)));
        assert!(filter.accepts(&FileRecord::new("b.py", 1)));
        assert_eq!(
            filter.rejection(&FileRecord::new("Makefile", 1)),
            Some(Rejection::ExtensionNotAllowed)
        );
    }

    #[test]
    fn test_bad_glob_is_config_error() {
        let config = FilterConfig {
            excluded_globs: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(ContentFilter::new(&config), Err(Error::Config(_))));
    }
}
