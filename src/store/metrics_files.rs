use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::evaluate::ScoredRecord;
use crate::model::{CurvePoint, MetricsSummary};
use crate::util::{read_json, write_json_pretty, write_replacing};

/// On-disk layout of the persisted evaluation outputs.
#[derive(Debug, Clone)]
pub struct MetricsPaths {
    pub summary: PathBuf,
    pub curve_tsv: PathBuf,
    pub predictions: PathBuf,
}

impl MetricsPaths {
    pub fn under(dir: &Path) -> Self {
        Self {
            summary: dir.join("metrics_summary.json"),
            curve_tsv: dir.join("coverage_curve.tsv"),
            predictions: dir.join("test_preds.jsonl"),
        }
    }
}

/// Overwrites all outputs of a run. The summary is written last, so a reader
/// never sees a summary newer than its curve and predictions.
pub fn persist(
    paths: &MetricsPaths,
    summary: &MetricsSummary,
    scored: &[ScoredRecord],
) -> Result<()> {
    write_predictions(&paths.predictions, scored)?;
    write_curve_tsv(&paths.curve_tsv, &summary.coverage_curve)?;
    write_json_pretty(&paths.summary, summary)
}

pub fn load_summary(path: &Path) -> Result<MetricsSummary> {
    read_json(path).with_context(|| {
        format!(
            "no readable metrics summary at {}; run `abstain evaluate` first",
            path.display()
        )
    })
}

fn write_curve_tsv(path: &Path, curve: &[CurvePoint]) -> Result<()> {
    write_replacing(path, |file| {
        writeln!(file, "tau\tcoverage\thalluc_rate")?;
        for point in curve {
            writeln!(
                file,
                "{:.2}\t{:.3}\t{:.3}",
                point.tau, point.coverage, point.halluc_rate
            )?;
        }
        Ok(())
    })
}

fn write_predictions(path: &Path, scored: &[ScoredRecord]) -> Result<()> {
    let mut lines = Vec::with_capacity(scored.len());
    for record in scored {
        lines.push(
            serde_json::to_string(record)
                .with_context(|| format!("failed to serialize prediction {}", record.id))?,
        );
    }

    write_replacing(path, |file| {
        for line in &lines {
            writeln!(file, "{line}")?;
        }
        Ok(())
    })
}
