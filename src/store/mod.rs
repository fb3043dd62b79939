pub mod evidence_db;
pub mod metrics_files;

use std::path::{Path, PathBuf};

pub use evidence_db::{EvidenceStore, StoredBundle};
pub use metrics_files::MetricsPaths;

pub fn default_db_path(cache_root: &Path) -> PathBuf {
    cache_root.join("evidence.sqlite")
}

pub fn default_metrics_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("metrics")
}

pub fn default_config_path(cache_root: &Path) -> PathBuf {
    cache_root.join("engine_config.json")
}
