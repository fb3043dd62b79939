use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::config::EngineConfig;
use crate::store::metrics_files::load_summary;
use crate::store::{
    EvidenceStore, MetricsPaths, default_config_path, default_db_path, default_metrics_dir,
};

pub fn run(args: StatusArgs) -> Result<()> {
    let config_path = default_config_path(&args.cache_root);
    let db_path = default_db_path(&args.cache_root);
    let metrics_paths = MetricsPaths::under(&default_metrics_dir(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    let config = EngineConfig::load(&config_path)?;
    info!(
        default_tau = config.policy.default_tau,
        min_overlap = ?config.policy.min_overlap,
        max_sc_var = ?config.policy.max_sc_var,
        bias = config.scorer.bias,
        w_sc_var = config.scorer.w_sc_var,
        w_entropy = config.scorer.w_entropy,
        w_overlap = config.scorer.w_overlap,
        "engine config"
    );

    if db_path.exists() {
        let store = EvidenceStore::open_read_only(&db_path)?;
        let counts = store.counts()?;
        info!(
            path = %db_path.display(),
            schema_version = %store.schema_version()?.unwrap_or_default(),
            bundles = counts.bundles,
            passages = counts.passages,
            samples = counts.samples,
            "evidence store status"
        );
    } else {
        warn!(path = %db_path.display(), "evidence store missing");
    }

    if metrics_paths.summary.exists() {
        let summary = load_summary(&metrics_paths.summary)?;
        info!(
            run_id = %summary.run_id,
            generated_at = %summary.generated_at,
            dataset_sha256 = %summary.dataset_sha256,
            evaluated = summary.evaluated_records,
            excluded = summary.excluded_records,
            roc_auc = ?summary.roc_auc,
            roc_auc_undefined = summary.roc_auc_undefined.is_some(),
            "metrics summary status"
        );
    } else {
        warn!(path = %metrics_paths.summary.display(), "metrics summary missing");
    }

    Ok(())
}
