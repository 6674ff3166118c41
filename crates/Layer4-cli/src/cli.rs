//! Analyze command - 설정 병합, 서비스 구성, 실행, 출력

use crate::local::LocalRepository;
use crate::markdown;
use anyhow::{bail, Context};
use clap::ValueEnum;
use lens_core::{Analyzer, Summary};
use lens_foundation::{AnalysisConfig, ConfigLoader};
use lens_service::{ExplanationService, OpenAiExplainer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// Options for one analysis run
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub max_files: Option<usize>,
    pub explain_limit: Option<usize>,
    pub concurrency: Option<usize>,
    pub no_explain: bool,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
}

/// 설정 레이어 병합 후 CLI 플래그 적용
pub fn load_config(path: &Path, explicit: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let mut loader = ConfigLoader::new().with_global().with_project(path);
    if let Some(file) = explicit {
        loader = loader.with_file(file);
    }
    Ok(loader.load()?)
}

fn apply_overrides(config: &mut AnalysisConfig, opts: &AnalyzeOptions) {
    if let Some(n) = opts.max_files {
        config.filter.max_files_to_analyze = n;
    }
    if let Some(n) = opts.explain_limit {
        config.explanation.max_files = n;
    }
    if let Some(n) = opts.concurrency {
        config.explanation.concurrency = n;
    }
    if opts.no_explain {
        config.explanation.enabled = false;
    }
}

/// Explanation service from flags; `None` when no key is available
fn build_service(opts: &AnalyzeOptions) -> Option<Arc<dyn ExplanationService>> {
    let Some(api_key) = opts.api_key.clone().filter(|k| !k.trim().is_empty()) else {
        warn!("No API key provided; file explanations are skipped");
        return None;
    };

    let service = match (&opts.azure_endpoint, &opts.azure_deployment) {
        (Some(endpoint), Some(deployment)) => {
            OpenAiExplainer::azure(api_key, endpoint, deployment.clone(), None)
        }
        _ => {
            let mut service = OpenAiExplainer::new(api_key);
            if let Some(url) = &opts.base_url {
                service = service.with_base_url(url);
            }
            if let Some(model) = &opts.model {
                service = service.with_model(model.clone());
            }
            service
        }
    };

    info!("Explanations via {} ({})", service.model(), service.url());
    Some(Arc::new(service))
}

/// Run the analysis and write the report
pub async fn run_analyze(opts: AnalyzeOptions, cancel: CancellationToken) -> anyhow::Result<()> {
    if !opts.path.is_dir() {
        bail!("not a directory: {}", opts.path.display());
    }

    let mut config = load_config(&opts.path, opts.config.as_deref())?;
    apply_overrides(&mut config, &opts);

    let service = if config.explanation.enabled {
        build_service(&opts)
    } else {
        None
    };

    let repo = LocalRepository::new(&opts.path, config.filter.max_file_size);
    let mut analyzer = Analyzer::new(config)?.with_cancellation(cancel);
    if let Some(service) = service {
        analyzer = analyzer.with_service(service);
    }

    let summary = analyzer.run(&repo, &repo.repo_ref()).await?;
    let rendered = render(&summary, opts.format)?;

    match &opts.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

pub fn render(summary: &Summary, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Markdown => markdown::render(summary),
        OutputFormat::Json => serde_json::to_string_pretty(summary)?,
    })
}

/// Print the merged config as TOML
pub fn show_config(path: &Path, explicit: Option<&Path>, defaults: bool) -> anyhow::Result<()> {
    let config = if defaults {
        AnalysisConfig::default()
    } else {
        load_config(path, explicit)?
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
