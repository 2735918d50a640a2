use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineEnvConfig;
use crate::engine::policy::PolicyId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedBlendConfig {
    #[serde(default = "default_rating_weight")]
    pub rating_weight: f64,
    #[serde(default = "default_success_weight")]
    pub success_weight: f64,
    #[serde(default = "default_usage_weight")]
    pub usage_weight: f64,
    /// 无历史活动参与评分时使用的中性均分（1-5 区间）
    #[serde(default = "default_neutral_rating")]
    pub neutral_rating: f64,
}

fn default_rating_weight() -> f64 {
    0.5
}
fn default_success_weight() -> f64 {
    0.3
}
fn default_usage_weight() -> f64 {
    0.2
}
fn default_neutral_rating() -> f64 {
    3.0
}

impl Default for WeightedBlendConfig {
    fn default() -> Self {
        Self {
            rating_weight: 0.5,
            success_weight: 0.3,
            usage_weight: 0.2,
            neutral_rating: 3.0,
        }
    }
}

/// Secondary ranking key applied after the score. Either variant ends at the
/// activity id, so the ordering is total and repeat calls pick the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TieBreak {
    LeastUsedFirst,
    IdOrder,
}

impl Default for TieBreak {
    fn default() -> Self {
        Self::LeastUsedFirst
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommenderConfig {
    #[serde(default = "default_policy")]
    pub default_policy: PolicyId,
    #[serde(default)]
    pub weighted: WeightedBlendConfig,
    #[serde(default)]
    pub tie_break: TieBreak,
}

fn default_policy() -> PolicyId {
    PolicyId::WeightedBlend
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_policy: PolicyId::WeightedBlend,
            weighted: WeightedBlendConfig::default(),
            tie_break: TieBreak::default(),
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.weighted;
        for (name, value) in [
            ("ratingWeight", w.rating_weight),
            ("successWeight", w.success_weight),
            ("usageWeight", w.usage_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative finite number"));
            }
        }
        if !w.neutral_rating.is_finite() || !(1.0..=5.0).contains(&w.neutral_rating) {
            return Err("neutralRating must be within [1, 5]".to_string());
        }
        Ok(())
    }

    pub fn from_env(env: &EngineEnvConfig) -> Self {
        let mut config = Self::default();

        match PolicyId::from_str(&env.default_policy) {
            Ok(policy) => config.default_policy = policy,
            Err(error) => {
                tracing::warn!(
                    value = %env.default_policy,
                    error = %error,
                    "Failed to parse default policy, using weighted_blend"
                );
            }
        }

        config.weighted.neutral_rating = env.neutral_rating;
        if config.validate().is_err() {
            tracing::warn!(
                neutral_rating = env.neutral_rating,
                "Invalid neutral rating from env, using default"
            );
            config.weighted.neutral_rating = default_neutral_rating();
        }

        config
    }
}
