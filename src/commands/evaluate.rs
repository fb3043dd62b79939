use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::cli::EvaluateArgs;
use crate::commands::{load_engine, resolve_tau};
use crate::evaluate::dataset::load_records;
use crate::evaluate::{self, Evaluation, NormalizedMatchJudge, TauGrid};
use crate::model::MetricsSummary;
use crate::store::metrics_files::persist;
use crate::store::{MetricsPaths, default_metrics_dir};
use crate::util::{now_utc_string, sha256_file, utc_compact_string};

const SUMMARY_MANIFEST_VERSION: u32 = 1;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("eval-{}", utc_compact_string(started_ts));

    let engine = load_engine(&args.cache_root, args.config.as_ref())?;
    let reference_tau = resolve_tau(&engine, args.tau)?;
    let grid = TauGrid::new(args.grid_points).context("invalid --grid-points")?;
    let judge = NormalizedMatchJudge::new(args.min_token_f1)?;

    let dataset_sha256 = sha256_file(&args.held_out)?;
    let records = load_records(&args.held_out)?;
    info!(
        run_id = %run_id,
        path = %args.held_out.display(),
        records = records.len(),
        grid_points = grid.points(),
        reference_tau = reference_tau.value(),
        "evaluation started"
    );

    let evaluation = evaluate::evaluate(records, &engine, &judge, &grid, reference_tau)
        .context("evaluation produced no metrics")?;

    let summary = MetricsSummary {
        manifest_version: SUMMARY_MANIFEST_VERSION,
        run_id,
        generated_at: now_utc_string(),
        dataset_path: args.held_out.display().to_string(),
        dataset_sha256,
        total_records: evaluation.total_records,
        evaluated_records: evaluation.scored.len(),
        excluded_records: evaluation.excluded.len(),
        positives: evaluation.positives,
        negatives: evaluation.negatives,
        grid_points: grid.points(),
        scorer: engine.config().scorer.snapshot(),
        roc_auc: evaluation.roc_auc.value(),
        roc_auc_undefined: evaluation.roc_auc.undefined_detail(),
        coverage_curve: evaluation.coverage_curve.clone(),
    };

    let metrics_dir = args
        .metrics_dir
        .clone()
        .unwrap_or_else(|| default_metrics_dir(&args.cache_root));
    let paths = MetricsPaths::under(&metrics_dir);
    persist(&paths, &summary, &evaluation.scored)?;

    log_curve(&evaluation);
    info!(
        summary = %paths.summary.display(),
        curve = %paths.curve_tsv.display(),
        predictions = %paths.predictions.display(),
        roc_auc = ?summary.roc_auc,
        "wrote metrics summary"
    );
    Ok(())
}

fn log_curve(evaluation: &Evaluation) {
    // Roughly ten points of the curve.
    let stride = (evaluation.coverage_curve.len() / 10).max(1);
    for point in evaluation.coverage_curve.iter().step_by(stride) {
        info!(
            tau = %format!("{:.2}", point.tau),
            coverage = %format!("{:.3}", point.coverage),
            halluc_rate = %format!("{:.3}", point.halluc_rate),
            answered = point.answered,
            "coverage point"
        );
    }
}
