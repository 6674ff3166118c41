//! Config - 통합 설정 관리
//!
//! - `analysis.rs` - AnalysisConfig (filter / priority / metrics / explanation)
//! - `loader.rs` - 계층형 TOML 설정 로더

mod analysis;
mod loader;

pub use analysis::{
    AnalysisConfig, ExplanationConfig, FilterConfig, MetricsConfig, PriorityWeights, RetryConfig,
};
pub use loader::{ConfigLoader, CONFIG_DIR, CONFIG_FILE};
