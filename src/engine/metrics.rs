use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::engine::policy::PolicyId;

#[derive(Default)]
pub struct PolicyMetrics {
    pub recommend_count: AtomicU64,
    pub empty_count: AtomicU64,
    pub total_latency_us: AtomicU64,
    pub last_called_at: AtomicI64,
}

pub struct MetricsRegistry {
    metrics: HashMap<PolicyId, PolicyMetrics>,
    outcome_count: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut metrics = HashMap::new();
        for id in &[PolicyId::WeightedBlend, PolicyId::LeastUsed] {
            metrics.insert(*id, PolicyMetrics::default());
        }
        Self {
            metrics,
            outcome_count: AtomicU64::new(0),
        }
    }

    pub fn record_recommend(&self, id: PolicyId, latency_us: u64, was_empty: bool) {
        if let Some(metric) = self.metrics.get(&id) {
            metric.recommend_count.fetch_add(1, Ordering::Relaxed);
            metric
                .total_latency_us
                .fetch_add(latency_us, Ordering::Relaxed);
            if was_empty {
                metric.empty_count.fetch_add(1, Ordering::Relaxed);
            }
            metric
                .last_called_at
                .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
        }
    }

    pub fn record_outcome(&self) {
        self.outcome_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn outcome_count(&self) -> u64 {
        self.outcome_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HashMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metric)| {
                (
                    id.as_str().to_string(),
                    MetricsSnapshot {
                        recommend_count: metric.recommend_count.load(Ordering::Relaxed),
                        empty_count: metric.empty_count.load(Ordering::Relaxed),
                        total_latency_us: metric.total_latency_us.load(Ordering::Relaxed),
                    },
                )
            })
            .collect()
    }

    pub fn reset(&self) {
        for metric in self.metrics.values() {
            metric.recommend_count.store(0, Ordering::Relaxed);
            metric.empty_count.store(0, Ordering::Relaxed);
            metric.total_latency_us.store(0, Ordering::Relaxed);
        }
        self.outcome_count.store(0, Ordering::Relaxed);
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub recommend_count: u64,
    pub empty_count: u64,
    pub total_latency_us: u64,
}
