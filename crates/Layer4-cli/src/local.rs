//! Local Repository - 로컬 디렉터리 제공자
//!
//! Walks a directory with `ignore` (respecting .gitignore) and reads files
//! with tokio. Hidden files are listed; the content filter decides on them.

use async_trait::async_trait;
use ignore::WalkBuilder;
use lens_core::{RepoRef, RepositoryContentProvider};
use lens_foundation::{FileRecord, ProviderError};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct LocalRepository {
    root: PathBuf,
    /// Files larger than this are not read
    max_bytes: u64,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Repository reference named after the directory
    pub fn repo_ref(&self) -> RepoRef {
        let name = self
            .root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| self.root.display().to_string());
        RepoRef::new(name, self.root.display().to_string())
    }

    /// `/`-separated path relative to the root
    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    fn walk(&self) -> Result<Vec<FileRecord>, ProviderError> {
        if !self.root.is_dir() {
            return Err(ProviderError::NotFound(self.root.display().to_string()));
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(path) = self.relative(entry.path()) else {
                continue;
            };
            // .git 내부는 목록에서 제외
            if path == ".git" || path.starts_with(".git/") {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(FileRecord::new(path, size));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[async_trait]
impl RepositoryContentProvider for LocalRepository {
    async fn list_files(&self, _repo: &RepoRef) -> Result<Vec<FileRecord>, ProviderError> {
        let files = self.walk()?;
        debug!("Listed {} files under {}", files.len(), self.root.display());
        Ok(files)
    }

    async fn get_content(
        &self,
        _repo: &RepoRef,
        path: &str,
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        let full = self.root.join(path);
        let metadata = tokio::fs::metadata(&full).await?;
        if metadata.len() > self.max_bytes {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read(&full).await?))
    }
}
