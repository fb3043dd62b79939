use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::evaluate::curve::DEFAULT_GRID_POINTS;

#[derive(Parser, Debug)]
#[command(
    name = "abstain",
    version,
    about = "Disagreement-aware answer/abstain engine and coverage evaluator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load retrieval/generation evidence bundles into the evidence store.
    Ingest(IngestArgs),
    /// Decide answer or abstain for one query.
    Qa(QaArgs),
    /// Sweep tau over a held-out set and persist the metrics summary.
    Evaluate(EvaluateArgs),
    /// Print the persisted metrics summary.
    Metrics(MetricsArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/abstain")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// JSON Lines file, one `{query, passages, samples, primary_answer}` per line.
    #[arg(long)]
    pub bundles: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct QaArgs {
    #[arg(long, default_value = ".cache/abstain")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub query: String,

    /// Overrides the configured default threshold.
    #[arg(long)]
    pub tau: Option<f64>,

    /// Truncate the ranked sources in the printed response.
    #[arg(long)]
    pub max_sources: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = ".cache/abstain")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON Lines held-out set with gold answers or labels.
    #[arg(long)]
    pub held_out: PathBuf,

    #[arg(long)]
    pub metrics_dir: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,

    /// Threshold recorded on each exported prediction.
    #[arg(long)]
    pub tau: Option<f64>,

    #[arg(long, default_value_t = 0.5)]
    pub min_token_f1: f64,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[arg(long, default_value = ".cache/abstain")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub metrics_dir: Option<PathBuf>,

    /// Print the whole summary including run provenance.
    #[arg(long, default_value_t = false)]
    pub full: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/abstain")]
    pub cache_root: PathBuf,
}
