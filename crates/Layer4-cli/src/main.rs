//! RepoLens CLI - Main entry point

mod cli;
mod local;
mod markdown;

use clap::{Parser, Subcommand};
use cli::{AnalyzeOptions, OutputFormat};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RepoLens - analyze a repository and summarize its structure
#[derive(Parser, Debug)]
#[command(name = "repolens")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Repository directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Additional config file (merged over global and project config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "markdown")]
    format: OutputFormat,

    /// Maximum number of files to analyze
    #[arg(long)]
    max_files: Option<usize>,

    /// Number of top-ranked files to explain
    #[arg(long)]
    explain_limit: Option<usize>,

    /// Maximum concurrent explanation requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skip file explanations
    #[arg(long)]
    no_explain: bool,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// API key for the explanation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    #[arg(long)]
    base_url: Option<String>,

    /// Azure OpenAI endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT", requires = "azure_deployment")]
    azure_endpoint: Option<String>,

    /// Azure OpenAI deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    azure_deployment: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the effective configuration as TOML
    Config {
        /// Print built-in defaults instead of the merged config
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 리포트가 stdout으로 나가므로 로그는 stderr
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Some(Command::Config { defaults }) = args.command {
        return cli::show_config(&args.path, args.config.as_deref(), defaults);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling outstanding work");
            on_signal.cancel();
        }
    });

    let opts = AnalyzeOptions {
        path: args.path,
        config: args.config,
        output: args.output,
        format: args.format,
        max_files: args.max_files,
        explain_limit: args.explain_limit,
        concurrency: args.concurrency,
        no_explain: args.no_explain,
        model: args.model,
        api_key: args.api_key,
        base_url: args.base_url,
        azure_endpoint: args.azure_endpoint,
        azure_deployment: args.azure_deployment,
    };

    cli::run_analyze(opts, cancel).await
}
