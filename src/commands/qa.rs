use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::QaArgs;
use crate::commands::{load_engine, resolve_tau, write_json_stdout};
use crate::store::{EvidenceStore, default_db_path};

pub fn run(args: QaArgs) -> Result<()> {
    if args.query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let engine = load_engine(&args.cache_root, args.config.as_ref())?;
    let tau = resolve_tau(&engine, args.tau)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let store = EvidenceStore::open_read_only(&db_path)?;

    let mut decision = engine
        .decide(&store, &args.query, tau)
        .context("failed to decide query")?;

    info!(
        decision = decision.decision.as_str(),
        p_disagree = decision.risk.p_disagree,
        sc_var = decision.risk.sc_var,
        overlap = decision.risk.overlap,
        entropy_proxy = decision.risk.entropy_proxy,
        tau = tau.value(),
        low_confidence_evidence = decision.low_confidence_evidence,
        sources = decision.sources.len(),
        "query decided"
    );

    if let Some(max_sources) = args.max_sources {
        decision.sources.truncate(max_sources);
    }
    write_json_stdout(&decision)
}
