use crate::config::PolicyConfig;
use crate::engine::features::Extraction;
use crate::error::ConfigError;
use crate::model::{AbstainReason, Decision, DecisionKind, EvidenceBundle, RiskSignals, Source};

/// Abstention threshold on `p_disagree`, validated into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tau(pub(super) f64);

impl Tau {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "tau",
                value,
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::OutOfRange {
                field: "tau",
                min: 0.0,
                max: 1.0,
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Answer gate shared by live decisions and the evaluator sweep.
pub fn gate(
    extraction: &Extraction,
    p_disagree: f64,
    tau: Tau,
    policy: &PolicyConfig,
) -> Result<(), AbstainReason> {
    if extraction.quality.fail_closed || extraction.top_answer.is_none() {
        return Err(AbstainReason::InsufficientEvidence);
    }
    if p_disagree.is_nan() || p_disagree > tau.value() {
        return Err(AbstainReason::HighRisk);
    }
    guard_rails(extraction, policy)
}

/// Opt-in conditions that hold independently of tau.
pub fn guard_rails(extraction: &Extraction, policy: &PolicyConfig) -> Result<(), AbstainReason> {
    let overlap_too_low = policy
        .min_overlap
        .is_some_and(|min_overlap| extraction.overlap < min_overlap);
    let dispersion_too_high = policy
        .max_sc_var
        .is_some_and(|max_sc_var| extraction.sc_var > max_sc_var);

    if overlap_too_low || dispersion_too_high {
        return Err(AbstainReason::GuardRail);
    }
    Ok(())
}

pub fn decide(
    bundle: &EvidenceBundle,
    extraction: &Extraction,
    p_disagree: f64,
    tau: Tau,
    policy: &PolicyConfig,
) -> Decision {
    let risk = RiskSignals {
        p_disagree,
        sc_var: extraction.sc_var,
        overlap: extraction.overlap,
        entropy_proxy: extraction.entropy_proxy,
    };
    let sources = bundle.passages.iter().map(Source::from).collect::<Vec<Source>>();

    let (decision, answer, abstain_reason) = match gate(extraction, p_disagree, tau, policy) {
        Ok(()) => (DecisionKind::Answer, extraction.top_answer.clone(), None),
        Err(reason) => (DecisionKind::Abstain, None, Some(reason)),
    };

    Decision {
        decision,
        risk,
        answer,
        sources,
        abstain_reason,
        low_confidence_evidence: extraction.quality.low_confidence(),
        tau: tau.value(),
    }
}
