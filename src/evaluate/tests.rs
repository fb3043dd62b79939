use super::*;
use crate::config::{EngineConfig, PolicyConfig};
use crate::model::Passage;

fn engine() -> DecisionEngine {
    DecisionEngine::new(EngineConfig::default()).expect("default engine should build")
}

fn judge() -> NormalizedMatchJudge {
    NormalizedMatchJudge::new(0.5).expect("judge should build")
}

fn tau(value: f64) -> Tau {
    Tau::new(value).expect("tau should be valid")
}

fn passages(texts: &[&str]) -> Vec<Passage> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| Passage {
            id: format!("p{index}"),
            title: format!("Passage {index}"),
            text: text.to_string(),
            score: 1.0 - index as f64 * 0.1,
        })
        .collect()
}

fn record(id: &str, samples: &[&str], gold: &str) -> HeldOutRecord {
    HeldOutRecord {
        id: id.to_string(),
        query: format!("question {id}"),
        passages: passages(&[
            "Paris is the capital of France",
            "The capital of France is Paris",
            "Paris is a large city in France",
        ]),
        samples: samples.iter().map(|value| value.to_string()).collect(),
        primary_answer: None,
        gold_answers: vec![gold.to_string()],
        label: None,
    }
}

fn mixed_set() -> Vec<Result<HeldOutRecord, RecordError>> {
    vec![
        Ok(record("agree-right", &["Paris", "Paris", "Paris", "Paris"], "Paris")),
        Ok(record("split-wrong", &["Lyon", "Nice", "Paris", "Lille"], "Paris")),
        Ok(record("mostly-right", &["Paris", "Paris", "Paris", "Lyon"], "Paris")),
        Ok(record("mostly-wrong", &["Lyon", "Lyon", "Nice", "Paris"], "Paris")),
    ]
}

#[test]
fn evaluation_orders_risk_by_disagreement() {
    let evaluation = evaluate(mixed_set(), &engine(), &judge(), &TauGrid::default(), tau(0.3))
        .expect("evaluation should succeed");

    assert_eq!(evaluation.total_records, 4);
    assert!(evaluation.excluded.is_empty());
    assert_eq!(evaluation.positives, 2);
    assert_eq!(evaluation.negatives, 2);
    assert_eq!(evaluation.roc_auc, RocAuc::Defined(1.0));

    let by_id = |id: &str| {
        evaluation
            .scored
            .iter()
            .find(|record| record.id == id)
            .expect("record should be scored")
            .clone()
    };
    assert!(by_id("agree-right").p_disagree < by_id("mostly-right").p_disagree);
    assert!(by_id("mostly-right").p_disagree < by_id("mostly-wrong").p_disagree);
    assert!(by_id("mostly-wrong").p_disagree < by_id("split-wrong").p_disagree);
    assert_eq!(
        by_id("agree-right").decision_at_reference_tau,
        DecisionKind::Answer
    );
}

#[test]
fn curve_is_monotone_and_complete_at_tau_one() {
    let evaluation = evaluate(mixed_set(), &engine(), &judge(), &TauGrid::default(), tau(0.3))
        .expect("evaluation should succeed");

    assert_eq!(evaluation.coverage_curve.len(), 101);
    assert!(
        evaluation
            .coverage_curve
            .windows(2)
            .all(|pair| pair[0].coverage <= pair[1].coverage)
    );
    let last = evaluation
        .coverage_curve
        .last()
        .expect("curve should not be empty");
    assert_eq!(last.coverage, 1.0);
    assert_eq!(last.halluc_rate, 0.5);
}

#[test]
fn bad_records_are_excluded_and_logged_not_fatal() {
    let mut records = mixed_set();
    records.push(Err(RecordError::Malformed {
        line: 9,
        message: "expected value".to_string(),
    }));
    let mut unlabeled = record("unlabeled", &["Paris"], "Paris");
    unlabeled.gold_answers.clear();
    records.push(Ok(unlabeled));

    let evaluation = evaluate(records, &engine(), &judge(), &TauGrid::default(), tau(0.3))
        .expect("evaluation should succeed");

    assert_eq!(evaluation.total_records, 6);
    assert_eq!(evaluation.scored.len(), 4);
    assert_eq!(evaluation.excluded.len(), 2);
    assert!(evaluation.excluded.contains(&RecordError::MissingLabel {
        id: "unlabeled".to_string()
    }));
}

#[test]
fn records_without_usable_samples_abstain_inside_the_denominator() {
    let mut records = mixed_set();
    records.push(Ok(record("silent", &[], "Paris")));
    let mut silent_labeled = record("silent-labeled", &["  "], "Paris");
    silent_labeled.gold_answers.clear();
    silent_labeled.label = Some(Label::Right);
    records.push(Ok(silent_labeled));

    let evaluation = evaluate(records, &engine(), &judge(), &TauGrid::default(), tau(1.0))
        .expect("evaluation should succeed");

    assert!(evaluation.excluded.is_empty());
    assert_eq!(evaluation.scored.len(), 6);

    let by_id = |id: &str| {
        evaluation
            .scored
            .iter()
            .find(|record| record.id == id)
            .expect("record should be scored")
            .clone()
    };
    let silent = by_id("silent");
    assert!(!silent.eligible);
    assert_eq!(silent.wrong, None);
    assert_eq!(silent.p_disagree, 1.0);
    assert_eq!(silent.decision_at_reference_tau, DecisionKind::Abstain);

    let silent_labeled = by_id("silent-labeled");
    assert!(!silent_labeled.eligible);
    assert_eq!(silent_labeled.wrong, Some(false));

    // Both count against coverage; only the labeled one joins the AUC.
    let last = evaluation
        .coverage_curve
        .last()
        .expect("curve should not be empty");
    assert_eq!(last.answered, 4);
    assert!((last.coverage - 4.0 / 6.0).abs() < 1e-12);
    assert_eq!(evaluation.positives, 2);
    assert_eq!(evaluation.negatives, 3);
}

#[test]
fn judge_sees_the_answer_the_engine_attaches() {
    let minority_first = record("minority-first", &["Lyon", "Paris", "Paris", "Paris"], "Paris");
    let live = engine().decide_assessed(
        &minority_first.bundle(),
        &engine().assess(&minority_first.bundle()),
        tau(1.0),
    );
    assert_eq!(live.answer.as_deref(), Some("Paris"));

    let evaluation = evaluate(
        vec![Ok(minority_first)],
        &engine(),
        &judge(),
        &TauGrid::default(),
        tau(1.0),
    )
    .expect("evaluation should succeed");

    assert_eq!(evaluation.scored[0].wrong, Some(false));
    let last = evaluation
        .coverage_curve
        .last()
        .expect("curve should not be empty");
    assert_eq!(last.answered, 1);
    assert_eq!(last.halluc_rate, 0.0);
}

#[test]
fn all_records_excluded_is_fatal() {
    let records = vec![Err(RecordError::Malformed {
        line: 1,
        message: "eof".to_string(),
    })];

    let err = evaluate(records, &engine(), &judge(), &TauGrid::default(), tau(0.3))
        .expect_err("empty denominator should fail");
    assert!(matches!(
        err,
        EvaluationError::NoUsableRecords {
            total: 1,
            excluded: 1
        }
    ));
}

#[test]
fn single_class_labels_leave_auc_undefined() {
    let records = vec![
        Ok(record("a", &["Paris", "Paris"], "Paris")),
        Ok(record("b", &["Paris", "Lyon"], "Paris")),
    ];

    let evaluation = evaluate(records, &engine(), &judge(), &TauGrid::default(), tau(0.3))
        .expect("evaluation should still produce a curve");
    assert_eq!(
        evaluation.roc_auc,
        RocAuc::Undefined {
            positives: 0,
            negatives: 2
        }
    );
    assert_eq!(evaluation.coverage_curve.len(), 101);
}

#[test]
fn precomputed_label_overrides_judge() {
    let mut labeled = record("labeled", &["Paris", "Paris"], "Paris");
    labeled.label = Some(Label::Wrong);
    let mut no_gold = record("no-gold", &["Lyon", "Lyon"], "Paris");
    no_gold.gold_answers.clear();
    no_gold.label = Some(Label::Right);

    let evaluation = evaluate(
        vec![Ok(labeled), Ok(no_gold)],
        &engine(),
        &judge(),
        &TauGrid::default(),
        tau(0.3),
    )
    .expect("evaluation should succeed");

    let wrong_ids = evaluation
        .scored
        .iter()
        .filter(|record| record.wrong == Some(true))
        .map(|record| record.id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(wrong_ids, vec!["labeled"]);
}

#[test]
fn fail_closed_records_are_scored_but_never_answered() {
    let mut empty_retrieval = record("empty", &["Paris", "Paris"], "Paris");
    empty_retrieval.passages.clear();
    let records = vec![
        Ok(empty_retrieval),
        Ok(record("fine", &["Paris", "Paris", "Paris"], "Paris")),
    ];

    let evaluation = evaluate(records, &engine(), &judge(), &TauGrid::default(), tau(1.0))
        .expect("evaluation should succeed");

    let empty = evaluation
        .scored
        .iter()
        .find(|record| record.id == "empty")
        .expect("fail-closed record is still scored");
    assert_eq!(empty.p_disagree, 1.0);
    assert!(!empty.eligible);
    assert_eq!(empty.wrong, None);
    assert_eq!(empty.decision_at_reference_tau, DecisionKind::Abstain);

    let last = evaluation
        .coverage_curve
        .last()
        .expect("curve should not be empty");
    assert_eq!(last.coverage, 0.5);
}

#[test]
fn guard_rails_shrink_coverage_consistently_with_live_policy() {
    let config = EngineConfig {
        policy: PolicyConfig {
            max_sc_var: Some(0.3),
            ..PolicyConfig::default()
        },
        ..EngineConfig::default()
    };
    let guarded = DecisionEngine::new(config).expect("guarded engine should build");

    let evaluation = evaluate(mixed_set(), &guarded, &judge(), &TauGrid::default(), tau(1.0))
        .expect("evaluation should succeed");

    let last = evaluation
        .coverage_curve
        .last()
        .expect("curve should not be empty");
    // Only records whose modal share is at least 0.75 pass the guard.
    assert_eq!(last.coverage, 0.5);
    assert_eq!(last.halluc_rate, 0.0);
}
