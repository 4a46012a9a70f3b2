//! Shared plumbing for the command-line binaries.

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{Config, Settings};
use docqa_pipeline::{IngestReport, RetrievalPipeline};

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

pub struct CliArgs {
    pub paths: Vec<PathBuf>,
    pub query: Option<String>,
    pub top_k: Option<usize>,
    pub rerank_top_n: Option<usize>,
}

fn parse_number(args: &[String], i: usize, flag: &str) -> Result<usize> {
    args.get(i + 1)
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| anyhow!("{flag} requires a number"))
}

/// `<path>... [--query <text>] [--top-k N] [--rerank-top-n N]`
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs { paths: Vec::new(), query: None, top_k: None, rerank_top_n: None };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--query" | "-q" => {
                parsed.query = Some(args.get(i + 1).cloned().ok_or_else(|| anyhow!("--query requires text"))?);
                i += 1;
            }
            "--top-k" => { parsed.top_k = Some(parse_number(args, i, "--top-k")?); i += 1; }
            "--rerank-top-n" => { parsed.rerank_top_n = Some(parse_number(args, i, "--rerank-top-n")?); i += 1; }
            other if other.starts_with('-') => return Err(anyhow!("Unknown flag: {other}")),
            path => parsed.paths.push(PathBuf::from(path)),
        }
        i += 1;
    }
    Ok(parsed)
}

/// Load configuration and apply command-line overrides.
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let config = Config::load().map_err(|e| { error!(error = %e, "Failed to load config"); e })?;
    let mut settings = config.settings()?;
    if let Some(k) = args.top_k { settings.retrieval.top_k = k; }
    if let Some(n) = args.rerank_top_n { settings.retrieval.rerank_top_n = n; }
    Ok(settings)
}

/// Ingest `paths` with a spinner on the terminal.
pub fn ingest_with_progress(rt: &tokio::runtime::Runtime, pipeline: &RetrievalPipeline, paths: Vec<PathBuf>) -> Result<IngestReport> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Indexing {} path(s)...", paths.len()));
    pb.enable_steady_tick(Duration::from_millis(100));
    match rt.block_on(pipeline.ingest_paths(paths)) {
        Ok(report) => {
            pb.finish_with_message(format!(
                "✅ Indexed {} chunks from {} documents with {} ({} ms)",
                report.chunks, report.documents, report.embedder_id, report.elapsed_ms
            ));
            Ok(report)
        }
        Err(e) => {
            pb.abandon_with_message("❌ Indexing failed");
            Err(e.into())
        }
    }
}
