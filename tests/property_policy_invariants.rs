use chrono::Utc;
use proptest::prelude::*;

use activity_recommender::engine::config::{TieBreak, WeightedBlendConfig};
use activity_recommender::engine::policy::{LeastUsed, ScoringPolicy, WeightedBlend};
use activity_recommender::engine::ranking::best_candidate;
use activity_recommender::store::operations::activities::{Activity, Stage};

fn activity(id: String, usage_count: u64, success_count: u64, total_rating: u64) -> Activity {
    Activity {
        id,
        stage: Stage::Primary,
        subject: "math".to_string(),
        lesson: "fractions".to_string(),
        description: String::new(),
        exercises: String::new(),
        application: String::new(),
        usage_count,
        success_count,
        total_rating,
        created_at: Utc::now(),
    }
}

prop_compose! {
    /// Statistics that respect the catalog invariants:
    /// success <= usage, usage <= total_rating <= 5 * usage.
    fn consistent_stats()(usage in 0_u64..500)(
        usage in Just(usage),
        success in 0..=usage,
        per_use_rating in 1_u64..=5,
    ) -> (u64, u64, u64) {
        (usage, success, usage * per_use_rating)
    }
}

proptest! {
    #[test]
    fn pt_derived_stats_stay_on_scale((usage, success, total) in consistent_stats()) {
        let a = activity("a".to_string(), usage, success, total);
        match a.avg_rating() {
            Some(avg) => prop_assert!((1.0..=5.0).contains(&avg)),
            None => prop_assert_eq!(usage, 0),
        }
        prop_assert!((0.0..=1.0).contains(&a.success_rate()));
    }

    #[test]
    fn pt_weighted_score_is_deterministic((usage, success, total) in consistent_stats()) {
        let policy = WeightedBlend::new(WeightedBlendConfig::default());
        let a = activity("a".to_string(), usage, success, total);
        prop_assert_eq!(policy.score(&a), policy.score(&a));
    }

    #[test]
    fn pt_weighted_score_decreases_with_usage(
        usage in 1_u64..500,
        per_use_rating in 1_u64..=5,
        succeeded in any::<bool>(),
        factor in 2_u64..10,
    ) {
        // Same per-use profile, strictly more usage: the penalty term is
        // unbounded, so the score must strictly drop.
        let policy = WeightedBlend::new(WeightedBlendConfig::default());
        let success = if succeeded { usage } else { 0 };
        let base = activity("a".to_string(), usage, success, usage * per_use_rating);
        let heavier = activity(
            "a".to_string(),
            usage * factor,
            success * factor,
            usage * factor * per_use_rating,
        );

        prop_assert!(policy.score(&heavier) < policy.score(&base));
    }

    #[test]
    fn pt_zero_usage_candidates_score_identically(ids in prop::collection::hash_set("[a-z]{1,6}", 2..8)) {
        let policy = WeightedBlend::new(WeightedBlendConfig::default());
        let scores: Vec<f64> = ids
            .iter()
            .map(|id| policy.score(&activity(id.clone(), 0, 0, 0)))
            .collect();
        for window in scores.windows(2) {
            prop_assert_eq!(window[0], window[1]);
        }
    }

    #[test]
    fn pt_zero_history_pick_is_the_smallest_id(ids in prop::collection::hash_set("[a-z]{1,6}", 1..8)) {
        let policy = WeightedBlend::new(WeightedBlendConfig::default());
        let candidates: Vec<Activity> = ids.iter().map(|id| activity(id.clone(), 0, 0, 0)).collect();
        let expected = ids.iter().min().unwrap().clone();

        let first = best_candidate(candidates.clone(), &policy, TieBreak::LeastUsedFirst).unwrap();
        let second = best_candidate(candidates, &policy, TieBreak::LeastUsedFirst).unwrap();

        prop_assert_eq!(&first.activity.id, &second.activity.id);
        prop_assert_eq!(first.activity.id, expected);
    }

    #[test]
    fn pt_least_used_pick_has_minimum_usage(usages in prop::collection::vec(0_u64..100, 1..10)) {
        let candidates: Vec<Activity> = usages
            .iter()
            .enumerate()
            .map(|(i, &usage)| activity(format!("a{i:02}"), usage, 0, usage))
            .collect();
        let min_usage = *usages.iter().min().unwrap();

        let picked = best_candidate(candidates, &LeastUsed, TieBreak::LeastUsedFirst).unwrap();
        prop_assert_eq!(picked.activity.usage_count, min_usage);
    }
}
