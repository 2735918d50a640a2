use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::keys;
use crate::store::operations::activities::{Activity, Outcome};
use crate::store::{Store, StoreError};
use crate::validation;

use super::activities::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Explanation,
    Exercise,
    Application,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explanation => "explanation",
            Self::Exercise => "exercise",
            Self::Application => "application",
        }
    }
}

impl Default for ActivityKind {
    fn default() -> Self {
        Self::Exercise
    }
}

/// 交互日志条目。写入后不可变，作为审计记录与历史回退建议的依据。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub id: String,
    pub learner_id: String,
    pub stage: Stage,
    pub subject: String,
    pub lesson: String,
    pub activity_id: String,
    pub kind: ActivityKind,
    pub rating: u8,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn append_event(&self, event: &InteractionEvent) -> Result<(), StoreError> {
        validation::validate_identifier(&event.learner_id)
            .map_err(|e| StoreError::Validation(format!("learner id: {e}")))?;
        validation::validate_rating(event.rating)
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let ts = event.created_at.timestamp_millis();
        let key = keys::interaction_key(&event.learner_id, ts, &event.id);
        self.interactions
            .insert(key.as_bytes(), Self::serialize(event)?)?;
        Ok(())
    }

    /// All events for a learner, newest first (reverse-timestamp key order).
    pub fn scan_learner_events(
        &self,
        learner_id: &str,
    ) -> Result<Vec<InteractionEvent>, StoreError> {
        let prefix = keys::interaction_prefix(learner_id);
        let mut events = Vec::new();
        for item in self.interactions.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            events.push(Self::deserialize::<InteractionEvent>(&value)?);
        }
        Ok(events)
    }

    pub fn count_learner_events(&self, learner_id: &str) -> Result<usize, StoreError> {
        let prefix = keys::interaction_prefix(learner_id);
        let mut count = 0usize;
        for item in self.interactions.scan_prefix(prefix.as_bytes()) {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn count_all_events(&self) -> Result<usize, StoreError> {
        let mut count = 0usize;
        for item in self.interactions.iter() {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }

    /// 提交结果的原子单元：统计更新 + 日志追加要么都发生，要么都不发生。
    /// 事务内部重读 activity，sled 乐观事务在键冲突时自动重跑闭包，
    /// 因此同一 activity 上的并发提交不会丢失任何一次计数。
    pub fn apply_outcome(
        &self,
        activity_id: &str,
        outcome: &Outcome,
        event: &InteractionEvent,
    ) -> Result<Activity, StoreError> {
        validation::validate_rating(outcome.rating)
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let activity_key = keys::activity_key(activity_id);
        let event_ts = event.created_at.timestamp_millis();
        let event_key = keys::interaction_key(&event.learner_id, event_ts, &event.id);
        let event_bytes = Self::serialize(event)?;

        let updated = (&self.activities, &self.interactions)
            .transaction(|(tx_activities, tx_interactions)| {
                let raw = tx_activities.get(activity_key.as_bytes())?.ok_or_else(|| {
                    sled::transaction::ConflictableTransactionError::Abort(StoreError::NotFound {
                        entity: "activity".to_string(),
                        key: activity_id.to_string(),
                    })
                })?;

                let mut activity: Activity = serde_json::from_slice(&raw).map_err(|error| {
                    sled::transaction::ConflictableTransactionError::Abort(
                        StoreError::Serialization(error),
                    )
                })?;

                activity.usage_count += 1;
                if outcome.success {
                    activity.success_count += 1;
                }
                activity.total_rating += outcome.rating as u64;

                let bytes = serde_json::to_vec(&activity).map_err(|error| {
                    sled::transaction::ConflictableTransactionError::Abort(
                        StoreError::Serialization(error),
                    )
                })?;

                tx_activities.insert(activity_key.as_bytes(), bytes.as_slice())?;
                tx_interactions.insert(event_key.as_bytes(), event_bytes.as_slice())?;

                Ok(activity)
            })
            .map_err(
                |error: sled::transaction::TransactionError<StoreError>| match error {
                    sled::transaction::TransactionError::Abort(store_error) => store_error,
                    sled::transaction::TransactionError::Storage(storage_error) => {
                        StoreError::Sled(storage_error)
                    }
                },
            )?;

        Ok(updated)
    }
}
