use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub score: f64,
}

/// Retrieval and generation evidence for one query, in retriever rank order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub samples: Vec<String>,
    #[serde(default)]
    pub primary_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    pub p_disagree: f64,
    pub sc_var: f64,
    pub overlap: f64,
    pub entropy_proxy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvidenceQuality {
    pub single_sample: bool,
    pub single_passage: bool,
    pub fail_closed: bool,
}

impl EvidenceQuality {
    pub fn low_confidence(&self) -> bool {
        self.single_sample || self.single_passage || self.fail_closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Answer,
    Abstain,
}

impl DecisionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Abstain => "abstain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstainReason {
    HighRisk,
    InsufficientEvidence,
    GuardRail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub text: String,
}

impl From<&Passage> for Source {
    fn from(passage: &Passage) -> Self {
        Self {
            title: passage.title.clone(),
            text: passage.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: DecisionKind,
    pub risk: RiskSignals,
    pub answer: Option<String>,
    pub sources: Vec<Source>,
    pub abstain_reason: Option<AbstainReason>,
    pub low_confidence_evidence: bool,
    pub tau: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub tau: f64,
    pub coverage: f64,
    pub halluc_rate: f64,
    pub answered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndefinedAuc {
    pub reason: String,
    pub positives: usize,
    pub negatives: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub dataset_path: String,
    pub dataset_sha256: String,
    pub total_records: usize,
    pub evaluated_records: usize,
    pub excluded_records: usize,
    pub positives: usize,
    pub negatives: usize,
    pub grid_points: usize,
    pub scorer: ScorerSnapshot,
    pub roc_auc: Option<f64>,
    pub roc_auc_undefined: Option<UndefinedAuc>,
    pub coverage_curve: Vec<CurvePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerSnapshot {
    pub bias: f64,
    pub w_sc_var: f64,
    pub w_entropy: f64,
    pub w_overlap: f64,
    pub unobserved_dispersion_prior: f64,
    pub unobserved_overlap_prior: f64,
}

/// Body returned to dashboard readers of the persisted summary.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse<'a> {
    pub roc_auc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roc_auc_undefined: Option<&'a UndefinedAuc>,
    pub coverage_curve: &'a [CurvePoint],
}

impl MetricsSummary {
    pub fn response(&self) -> MetricsResponse<'_> {
        MetricsResponse {
            roc_auc: self.roc_auc,
            roc_auc_undefined: self.roc_auc_undefined.as_ref(),
            coverage_curve: &self.coverage_curve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_bundle_deserializes_with_missing_optional_fields() {
        let raw = r#"{ "passages": [{ "id": "p1", "text": "Paris is in France." }] }"#;
        let bundle: EvidenceBundle = serde_json::from_str(raw).expect("bundle should parse");

        assert_eq!(bundle.passages.len(), 1);
        assert_eq!(bundle.passages[0].title, "");
        assert_eq!(bundle.passages[0].score, 0.0);
        assert!(bundle.samples.is_empty());
        assert!(bundle.primary_answer.is_none());
    }

    #[test]
    fn decision_serializes_contract_field_names() {
        let decision = Decision {
            decision: DecisionKind::Abstain,
            risk: RiskSignals {
                p_disagree: 1.0,
                sc_var: 1.0,
                overlap: 0.0,
                entropy_proxy: 1.0,
            },
            answer: None,
            sources: vec![],
            abstain_reason: Some(AbstainReason::InsufficientEvidence),
            low_confidence_evidence: true,
            tau: 0.3,
        };

        let value = serde_json::to_value(&decision).expect("decision should serialize");
        assert_eq!(value["decision"], "abstain");
        assert!(value["answer"].is_null());
        assert_eq!(value["risk"]["p_disagree"], 1.0);
        assert_eq!(value["abstain_reason"], "insufficient_evidence");
    }
}
