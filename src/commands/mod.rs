pub mod evaluate;
pub mod ingest;
pub mod metrics;
pub mod qa;
pub mod status;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::{DecisionEngine, Tau};
use crate::store::default_config_path;

/// Loads the engine configuration once for this process.
fn load_engine(cache_root: &Path, config_path: Option<&PathBuf>) -> Result<DecisionEngine> {
    let path = config_path
        .cloned()
        .unwrap_or_else(|| default_config_path(cache_root));
    let config = EngineConfig::load(&path)?;
    DecisionEngine::new(config).context("engine config failed validation")
}

fn resolve_tau(engine: &DecisionEngine, requested: Option<f64>) -> Result<Tau> {
    match requested {
        Some(value) => Tau::new(value).context("invalid --tau"),
        None => Ok(engine.default_tau()),
    }
}

fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
