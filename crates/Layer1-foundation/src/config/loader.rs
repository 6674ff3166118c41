//! Config Loader - 글로벌 + 프로젝트 + 명시적 설정 병합
//!
//! 우선순위 (나중이 우선):
//! 1. `~/.repolens/config.toml`
//! 2. `<repo>/.repolens/config.toml`
//! 3. `--config <path>`
//!
//! Tables are merged key by key, so a project file may override a single
//! field of a section without restating the rest.

use super::AnalysisConfig;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 설정 디렉토리명
pub const CONFIG_DIR: &str = ".repolens";

/// 설정 파일명
pub const CONFIG_FILE: &str = "config.toml";

/// Layered TOML loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    layers: Vec<Layer>,
}

#[derive(Debug, Clone)]
struct Layer {
    path: PathBuf,
    /// Explicit layers must exist; discovered ones are optional
    required: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 글로벌 (`~/.repolens/config.toml`) 레이어 추가
    pub fn with_global(mut self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.layers.push(Layer {
                path: home.join(CONFIG_DIR).join(CONFIG_FILE),
                required: false,
            });
        }
        self
    }

    /// 프로젝트 (`<root>/.repolens/config.toml`) 레이어 추가
    pub fn with_project(mut self, root: impl AsRef<Path>) -> Self {
        self.layers.push(Layer {
            path: root.as_ref().join(CONFIG_DIR).join(CONFIG_FILE),
            required: false,
        });
        self
    }

    /// 명시적 설정 파일 (없으면 에러)
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.layers.push(Layer {
            path: path.into(),
            required: true,
        });
        self
    }

    /// Merge all layers over the defaults and validate the result
    pub fn load(&self) -> Result<AnalysisConfig> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        for layer in &self.layers {
            if !layer.path.exists() {
                if layer.required {
                    return Err(Error::config(format!(
                        "config file not found: {}",
                        layer.path.display()
                    )));
                }
                continue;
            }

            let text = std::fs::read_to_string(&layer.path)?;
            let value: toml::Value = toml::from_str(&text).map_err(|e| {
                Error::config(format!("{}: {}", layer.path.display(), e))
            })?;
            debug!("Loaded config layer {}", layer.path.display());
            merge_value(&mut merged, value);
        }

        let config: AnalysisConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// 테이블은 재귀 병합, 나머지는 덮어쓰기
fn merge_value(base: &mut toml::Value, other: toml::Value) {
    match (base, other) {
        (toml::Value::Table(base), toml::Value::Table(other)) => {
            for (key, value) in other {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_without_files_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigLoader::new().with_project(temp.path()).load().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_later_layer_wins_per_key() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            ".repolens/config.toml",
            "[explanation]\nmax_files = 4\nconcurrency = 2\n",
        );
        let explicit = write(
            temp.path(),
            "custom.toml",
            "[explanation]\nconcurrency = 5\n",
        );

        let config = ConfigLoader::new()
            .with_project(temp.path())
            .with_file(explicit)
            .load()
            .unwrap();

        assert_eq!(config.explanation.max_files, 4);
        assert_eq!(config.explanation.concurrency, 5);
        assert_eq!(config.explanation.max_code_length, 8000);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = ConfigLoader::new()
            .with_file(temp.path().join("nope.toml"))
            .load();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "bad.toml", "[explanation]\nconcurrency = 0\n");
        let result = ConfigLoader::new().with_file(path).load();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
