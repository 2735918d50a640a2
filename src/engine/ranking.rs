//! 候选排序：按策略得分选出唯一最优活动，平分时走配置的次级键。

use std::cmp::Ordering;

use serde::Serialize;

use crate::engine::config::TieBreak;
use crate::engine::policy::{PolicyId, ScoringPolicy};
use crate::store::operations::activities::Activity;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedActivity {
    pub activity: Activity,
    pub score: f64,
    pub policy: PolicyId,
}

fn rank_order(a: &(f64, Activity), b: &(f64, Activity), tie_break: TieBreak) -> Ordering {
    let by_score = a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
    match tie_break {
        // Reversed comparisons: lower usage / smaller id ranks as "greater".
        TieBreak::LeastUsedFirst => by_score
            .then_with(|| b.1.usage_count.cmp(&a.1.usage_count))
            .then_with(|| b.1.id.cmp(&a.1.id)),
        TieBreak::IdOrder => by_score.then_with(|| b.1.id.cmp(&a.1.id)),
    }
}

/// Scores every candidate and returns the maximum. Ids are unique within a
/// catalog, so the ordering is total and the pick is deterministic even when
/// every candidate has identical statistics.
pub fn best_candidate(
    candidates: Vec<Activity>,
    policy: &dyn ScoringPolicy,
    tie_break: TieBreak,
) -> Option<RankedActivity> {
    candidates
        .into_iter()
        .map(|activity| (policy.score(&activity), activity))
        .max_by(|a, b| rank_order(a, b, tie_break))
        .map(|(score, activity)| RankedActivity {
            activity,
            score,
            policy: policy.id(),
        })
}
