//! 评分策略：对候选活动给出可比较的排序分。策略之间可互换，
//! 引擎不内置任何公式。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::config::{RecommenderConfig, WeightedBlendConfig};
use crate::store::operations::activities::Activity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyId {
    WeightedBlend,
    LeastUsed,
}

impl PolicyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightedBlend => "weighted_blend",
            Self::LeastUsed => "least_used",
        }
    }
}

impl FromStr for PolicyId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "weighted_blend" | "weighted-blend" => Ok(Self::WeightedBlend),
            "least_used" | "least-used" => Ok(Self::LeastUsed),
            other => Err(format!("unknown scoring policy: {other}")),
        }
    }
}

/// Pure scoring function over a candidate's aggregate statistics. Must be
/// deterministic: equal input activities always produce equal scores.
pub trait ScoringPolicy: Send + Sync {
    fn id(&self) -> PolicyId;
    fn score(&self, activity: &Activity) -> f64;
}

/// 默认策略：加权混合历史评分、成功率与使用频次惩罚。
/// usage_penalty 不设上限，高频活动被持续压低，从而保留探索空间。
pub struct WeightedBlend {
    config: WeightedBlendConfig,
}

impl WeightedBlend {
    pub fn new(config: WeightedBlendConfig) -> Self {
        Self { config }
    }
}

impl ScoringPolicy for WeightedBlend {
    fn id(&self) -> PolicyId {
        PolicyId::WeightedBlend
    }

    fn score(&self, activity: &Activity) -> f64 {
        let c = &self.config;
        // Untouched activities score with the neutral midpoint, not zero.
        let avg_rating = activity.avg_rating().unwrap_or(c.neutral_rating);
        c.rating_weight * avg_rating + c.success_weight * activity.success_rate()
            - c.usage_weight * activity.usage_count as f64
    }
}

/// 备选策略：只看使用次数，最少使用者优先。
pub struct LeastUsed;

impl ScoringPolicy for LeastUsed {
    fn id(&self) -> PolicyId {
        PolicyId::LeastUsed
    }

    fn score(&self, activity: &Activity) -> f64 {
        -(activity.usage_count as f64)
    }
}

pub fn from_config(config: &RecommenderConfig) -> Box<dyn ScoringPolicy> {
    match config.default_policy {
        PolicyId::WeightedBlend => Box::new(WeightedBlend::new(config.weighted.clone())),
        PolicyId::LeastUsed => Box::new(LeastUsed),
    }
}
