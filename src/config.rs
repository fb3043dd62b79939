use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::model::ScorerSnapshot;
use crate::similarity::SimilarityMetric;

pub const DEFAULT_TAU: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub features: FeatureConfig,
    pub scorer: ScorerConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub overlap_top_n: usize,
    pub overlap_metric: SimilarityMetric,
    pub cluster_similarity: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            overlap_top_n: 3,
            overlap_metric: SimilarityMetric::Jaccard,
            cluster_similarity: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub bias: f64,
    pub w_sc_var: f64,
    pub w_entropy: f64,
    pub w_overlap: f64,
    /// Stand-in for `sc_var` and `entropy_proxy` when only one sample exists.
    pub unobserved_dispersion_prior: f64,
    /// Stand-in for `overlap` when only one passage exists.
    pub unobserved_overlap_prior: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            bias: -2.0,
            w_sc_var: 3.0,
            w_entropy: 2.0,
            w_overlap: 2.5,
            unobserved_dispersion_prior: 0.5,
            unobserved_overlap_prior: 0.5,
        }
    }
}

impl ScorerConfig {
    pub fn snapshot(&self) -> ScorerSnapshot {
        ScorerSnapshot {
            bias: self.bias,
            w_sc_var: self.w_sc_var,
            w_entropy: self.w_entropy,
            w_overlap: self.w_overlap,
            unobserved_dispersion_prior: self.unobserved_dispersion_prior,
            unobserved_overlap_prior: self.unobserved_overlap_prior,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub default_tau: f64,
    pub min_overlap: Option<f64>,
    pub max_sc_var: Option<f64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_tau: DEFAULT_TAU,
            min_overlap: None,
            max_sc_var: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let features = &self.features;
        if !(2..=10).contains(&features.overlap_top_n) {
            return Err(ConfigError::OutOfRange {
                field: "features.overlap_top_n",
                min: 2.0,
                max: 10.0,
                value: features.overlap_top_n as f64,
            });
        }
        check_unit("features.cluster_similarity", features.cluster_similarity)?;

        let scorer = &self.scorer;
        check_finite("scorer.bias", scorer.bias)?;
        check_weight("scorer.w_sc_var", scorer.w_sc_var)?;
        check_weight("scorer.w_entropy", scorer.w_entropy)?;
        check_weight("scorer.w_overlap", scorer.w_overlap)?;
        check_unit(
            "scorer.unobserved_dispersion_prior",
            scorer.unobserved_dispersion_prior,
        )?;
        if scorer.unobserved_dispersion_prior <= 0.0 {
            return Err(ConfigError::Constraint {
                field: "scorer.unobserved_dispersion_prior",
                constraint: "must be above 0 so a single sample never reads as agreement",
                value: scorer.unobserved_dispersion_prior,
            });
        }
        check_unit(
            "scorer.unobserved_overlap_prior",
            scorer.unobserved_overlap_prior,
        )?;
        if scorer.unobserved_overlap_prior >= 1.0 {
            return Err(ConfigError::Constraint {
                field: "scorer.unobserved_overlap_prior",
                constraint: "must be below 1 so a single passage never reads as agreement",
                value: scorer.unobserved_overlap_prior,
            });
        }

        check_unit("policy.default_tau", self.policy.default_tau)?;
        if let Some(value) = self.policy.min_overlap {
            check_unit("policy.min_overlap", value)?;
        }
        if let Some(value) = self.policy.max_sc_var {
            check_unit("policy.max_sc_var", value)?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "engine config missing; using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("invalid engine config {}", path.display()))?;
        info!(
            path = %path.display(),
            overlap_top_n = config.features.overlap_top_n,
            overlap_metric = config.features.overlap_metric.as_str(),
            default_tau = config.policy.default_tau,
            "loaded engine config"
        );
        Ok(config)
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn check_weight(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            min: 0.0,
            max: f64::INFINITY,
            value,
        });
    }
    Ok(())
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}
