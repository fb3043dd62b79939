use crate::config::ScorerConfig;
use crate::engine::features::Extraction;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskScorer {
    config: ScorerConfig,
}

impl RiskScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn probability(&self, overlap: f64, sc_var: f64, entropy_proxy: f64) -> f64 {
        let overlap = unit_or(overlap, 0.0);
        let sc_var = unit_or(sc_var, 1.0);
        let entropy_proxy = unit_or(entropy_proxy, 1.0);

        // w_* >= 0, so z never falls as sc_var or entropy rise.
        let z = self.config.bias + self.config.w_sc_var * sc_var
            + self.config.w_entropy * entropy_proxy
            - self.config.w_overlap * overlap;
        sigmoid(z)
    }

    /// One sample leaves dispersion unobserved and one passage leaves
    /// agreement unobserved; both are scored with the configured priors.
    pub fn score(&self, extraction: &Extraction) -> f64 {
        if extraction.quality.fail_closed {
            return 1.0;
        }

        let (sc_var, entropy_proxy) = if extraction.quality.single_sample {
            let prior = self.config.unobserved_dispersion_prior;
            (prior, prior)
        } else {
            (extraction.sc_var, extraction.entropy_proxy)
        };
        let overlap = if extraction.quality.single_passage {
            self.config.unobserved_overlap_prior
        } else {
            extraction.overlap
        };

        self.probability(overlap, sc_var, entropy_proxy)
    }
}

/// Clamps into [0, 1]; NaN maps to the riskiest value for that signal.
fn unit_or(value: f64, nan_value: f64) -> f64 {
    if value.is_nan() {
        nan_value
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
