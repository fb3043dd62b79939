pub mod evidence;
pub mod features;
pub mod policy;
pub mod scorer;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError};
use crate::model::{Decision, EvidenceBundle};

pub use evidence::EvidenceSource;
pub use features::Extraction;
pub use policy::Tau;
pub use scorer::RiskScorer;

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub extraction: Extraction,
    pub p_disagree: f64,
}

/// Immutable after construction; shareable across threads.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    scorer: RiskScorer,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = RiskScorer::new(config.scorer.clone());
        Ok(Self { config, scorer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn default_tau(&self) -> Tau {
        Tau(self.config.policy.default_tau)
    }

    pub fn assess(&self, bundle: &EvidenceBundle) -> Assessment {
        let extraction = features::extract(bundle, &self.config.features);
        let p_disagree = self.scorer.score(&extraction);
        Assessment {
            extraction,
            p_disagree,
        }
    }

    pub fn decide_assessed(
        &self,
        bundle: &EvidenceBundle,
        assessment: &Assessment,
        tau: Tau,
    ) -> Decision {
        policy::decide(
            bundle,
            &assessment.extraction,
            assessment.p_disagree,
            tau,
            &self.config.policy,
        )
    }

    /// Gathers evidence for `query` and decides at `tau`.
    pub fn decide(
        &self,
        source: &dyn EvidenceSource,
        query: &str,
        tau: Tau,
    ) -> Result<Decision, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        let bundle = EvidenceBundle {
            passages: source.retrieve(query)?,
            samples: source.sample(query)?,
            primary_answer: source.primary_answer(query)?,
        };
        let assessment = self.assess(&bundle);
        let decision = self.decide_assessed(&bundle, &assessment, tau);

        debug!(
            passages = bundle.passages.len(),
            samples = assessment.extraction.sample_count,
            answer_clusters = assessment.extraction.cluster_count,
            p_disagree = decision.risk.p_disagree,
            tau = tau.value(),
            decision = decision.decision.as_str(),
            "query decided"
        );
        Ok(decision)
    }
}
