use anyhow::Result;
use tracing::info;

use crate::cli::MetricsArgs;
use crate::commands::write_json_stdout;
use crate::store::metrics_files::load_summary;
use crate::store::{MetricsPaths, default_metrics_dir};

pub fn run(args: MetricsArgs) -> Result<()> {
    let metrics_dir = args
        .metrics_dir
        .clone()
        .unwrap_or_else(|| default_metrics_dir(&args.cache_root));
    let paths = MetricsPaths::under(&metrics_dir);
    let summary = load_summary(&paths.summary)?;

    info!(
        run_id = %summary.run_id,
        generated_at = %summary.generated_at,
        roc_auc = ?summary.roc_auc,
        points = summary.coverage_curve.len(),
        "loaded metrics summary"
    );

    if args.full {
        write_json_stdout(&summary)
    } else {
        write_json_stdout(&summary.response())
    }
}
