//! Repository Content Provider - 저장소 파일 목록 / 내용 조회

use async_trait::async_trait;
use lens_foundation::{FileRecord, ProviderError};
use serde::{Deserialize, Serialize};

/// Identifies a repository snapshot for a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Display name (e.g. `owner/repo` or a directory name)
    pub name: String,
    /// Provider-specific location (path, URL)
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl RepoRef {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

/// Lists a repository and fetches file contents.
///
/// Errors from either call are fatal for the run.
#[async_trait]
pub trait RepositoryContentProvider: Send + Sync {
    /// Metadata for every file; `content` is left empty
    async fn list_files(&self, repo: &RepoRef) -> Result<Vec<FileRecord>, ProviderError>;

    /// Raw bytes of one file; `None` when the provider omits it (binary, too large)
    async fn get_content(
        &self,
        repo: &RepoRef,
        path: &str,
    ) -> Result<Option<Vec<u8>>, ProviderError>;
}

/// Bytes → text; binary (NUL bytes) or non-UTF-8 content is dropped
pub fn decode_text(bytes: Vec<u8>) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"fn main() {}".to_vec()).as_deref(), Some("fn main() {}"));
        assert_eq!(decode_text(vec![0xff, 0xfe, 0x41]), None);
        assert_eq!(decode_text(b"PNG\0\0".to_vec()), None);
    }
}
