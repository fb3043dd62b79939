use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::IngestArgs;
use crate::store::{EvidenceStore, StoredBundle, default_db_path};
use crate::util::{ensure_directory, sha256_file};

pub fn run(args: IngestArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let bundles = read_bundles(&args.bundles)?;
    if bundles.is_empty() {
        bail!("no evidence bundles found in {}", args.bundles.display());
    }
    let source_hash = sha256_file(&args.bundles)?;

    let mut store = EvidenceStore::open_for_write(&db_path)?;
    let written = store.upsert_bundles(&bundles, &source_hash)?;
    let counts = store.counts()?;

    info!(
        path = %db_path.display(),
        source = %args.bundles.display(),
        source_hash = %source_hash,
        read = bundles.len(),
        written,
        skipped = bundles.len() - written,
        "ingested evidence bundles"
    );
    info!(
        bundles = counts.bundles,
        passages = counts.passages,
        samples = counts.samples,
        "evidence store totals"
    );
    Ok(())
}

fn read_bundles(path: &Path) -> Result<Vec<StoredBundle>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let mut bundles = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let bundle = serde_json::from_str::<StoredBundle>(&line).with_context(|| {
            format!("malformed bundle at {}:{}", path.display(), index + 1)
        })?;
        bundles.push(bundle);
    }
    Ok(bundles)
}
