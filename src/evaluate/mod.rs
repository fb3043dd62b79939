pub mod curve;
pub mod dataset;
pub mod judge;
pub mod roc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{DecisionEngine, Tau, policy};
use crate::error::{EvaluationError, RecordError};
use crate::model::{CurvePoint, DecisionKind};

pub use curve::{SweepEntry, TauGrid, coverage_curve};
pub use dataset::{HeldOutRecord, Label};
pub use judge::{CorrectnessJudge, NormalizedMatchJudge};
pub use roc::{RocAuc, roc_auc};

/// Per-record outcome, also exported as one prediction line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub id: String,
    pub p_disagree: f64,
    pub overlap: f64,
    pub sc_var: f64,
    pub entropy_proxy: f64,
    /// None when the engine gives no answer to judge and no label exists.
    pub wrong: Option<bool>,
    pub eligible: bool,
    pub low_confidence_evidence: bool,
    pub decision_at_reference_tau: DecisionKind,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub total_records: usize,
    pub excluded: Vec<RecordError>,
    pub scored: Vec<ScoredRecord>,
    pub coverage_curve: Vec<CurvePoint>,
    pub roc_auc: RocAuc,
    pub positives: usize,
    pub negatives: usize,
}

/// Scores every usable record and aggregates the curve and AUC.
///
/// `reference_tau` only labels each exported prediction; the curve sweeps
/// the whole grid.
pub fn evaluate(
    records: Vec<Result<HeldOutRecord, RecordError>>,
    engine: &DecisionEngine,
    judge: &dyn CorrectnessJudge,
    grid: &TauGrid,
    reference_tau: Tau,
) -> Result<Evaluation, EvaluationError> {
    let total_records = records.len();

    let outcomes = records
        .into_par_iter()
        .map(|record| record.and_then(|record| score_record(&record, engine, judge, reference_tau)))
        .collect::<Vec<Result<ScoredRecord, RecordError>>>();

    let mut scored = Vec::with_capacity(outcomes.len());
    let mut excluded = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => scored.push(record),
            Err(err) => {
                warn!(error = %err, "excluding held-out record");
                excluded.push(err);
            }
        }
    }

    if scored.is_empty() {
        return Err(EvaluationError::NoUsableRecords {
            total: total_records,
            excluded: excluded.len(),
        });
    }

    let sweep = scored
        .iter()
        .map(|record| SweepEntry {
            p_disagree: record.p_disagree,
            wrong: record.wrong == Some(true),
            eligible: record.eligible,
        })
        .collect::<Vec<SweepEntry>>();
    let coverage_curve = coverage_curve(&sweep, grid);

    let labeled = scored
        .iter()
        .filter_map(|record| record.wrong.map(|wrong| (record.p_disagree, wrong)))
        .collect::<Vec<(f64, bool)>>();
    let roc_auc = roc_auc(&labeled);
    let positives = labeled.iter().filter(|(_, wrong)| *wrong).count();
    let negatives = labeled.len() - positives;

    info!(
        total = total_records,
        evaluated = scored.len(),
        unlabeled = scored.len() - labeled.len(),
        excluded = excluded.len(),
        positives,
        negatives,
        roc_auc = ?roc_auc.value(),
        grid_points = grid.points(),
        "evaluation aggregated"
    );

    Ok(Evaluation {
        total_records,
        excluded,
        scored,
        coverage_curve,
        roc_auc,
        positives,
        negatives,
    })
}

/// Judges the answer the engine itself would attach. Records the engine
/// would never answer stay in the coverage denominator; without a label they
/// are left out of the AUC only.
fn score_record(
    record: &HeldOutRecord,
    engine: &DecisionEngine,
    judge: &dyn CorrectnessJudge,
    reference_tau: Tau,
) -> Result<ScoredRecord, RecordError> {
    if record.label.is_none() && record.gold_answers.is_empty() {
        return Err(RecordError::MissingLabel {
            id: record.id.clone(),
        });
    }

    let bundle = record.bundle();
    let assessment = engine.assess(&bundle);
    let extraction = &assessment.extraction;

    let wrong = match (record.label, extraction.top_answer.as_deref()) {
        (Some(label), _) => Some(label == Label::Wrong),
        (None, Some(answer)) => Some(!judge.matches_any(answer, &record.gold_answers)),
        (None, _) => None,
    };

    let eligible = !extraction.quality.fail_closed
        && extraction.top_answer.is_some()
        && policy::guard_rails(extraction, &engine.config().policy).is_ok();
    let decision_at_reference_tau = engine
        .decide_assessed(&bundle, &assessment, reference_tau)
        .decision;

    Ok(ScoredRecord {
        id: record.id.clone(),
        p_disagree: assessment.p_disagree,
        overlap: extraction.overlap,
        sc_var: extraction.sc_var,
        entropy_proxy: extraction.entropy_proxy,
        wrong,
        eligible,
        low_confidence_evidence: extraction.quality.low_confidence(),
        decision_at_reference_tau,
    })
}

#[cfg(test)]
mod tests;
