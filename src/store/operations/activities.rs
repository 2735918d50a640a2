use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};
use crate::validation;

const MAX_CAS_ATTEMPTS: u32 = 10;

/// 学段枚举。存储层与索引键都使用 as_str() 的小写形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Primary,
    Middle,
    Secondary,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Middle => "middle",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "middle" => Ok(Self::Middle),
            "secondary" => Ok(Self::Secondary),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub stage: Stage,
    pub subject: String,
    pub lesson: String,
    pub description: String,
    pub exercises: String,
    pub application: String,
    pub usage_count: u64,
    pub success_count: u64,
    pub total_rating: u64,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// 平均评分为派生值：total_rating / usage_count，从不落盘。
    pub fn avg_rating(&self) -> Option<f64> {
        if self.usage_count == 0 {
            None
        } else {
            Some(self.total_rating as f64 / self.usage_count as f64)
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.usage_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.usage_count as f64
        }
    }

    fn record_outcome(&mut self, outcome: &Outcome) {
        self.usage_count += 1;
        if outcome.success {
            self.success_count += 1;
        }
        self.total_rating += outcome.rating as u64;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub rating: u8,
    pub success: bool,
}

fn validate_activity(activity: &Activity) -> Result<(), StoreError> {
    validation::validate_identifier(activity.id.as_str())
        .map_err(|e| StoreError::Validation(format!("activity id: {e}")))?;
    validation::validate_taxonomy_field(activity.subject.as_str())
        .map_err(|e| StoreError::Validation(format!("subject: {e}")))?;
    validation::validate_taxonomy_field(activity.lesson.as_str())
        .map_err(|e| StoreError::Validation(format!("lesson: {e}")))?;
    if activity.success_count > activity.usage_count {
        return Err(StoreError::Validation(
            "successCount exceeds usageCount".to_string(),
        ));
    }
    if activity.total_rating > activity.usage_count * 5 {
        return Err(StoreError::Validation(
            "totalRating exceeds 5 per usage".to_string(),
        ));
    }
    Ok(())
}

impl Store {
    pub fn upsert_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        validate_activity(activity)?;

        let key = keys::activity_key(&activity.id);
        let filter_key = keys::activity_filter_key(
            activity.stage,
            &activity.subject,
            &activity.lesson,
            &activity.id,
        );

        // Re-filing under a new stage/subject/lesson must drop the old
        // index entry, or stale keys would keep matching the old criteria.
        if let Some(raw) = self.activities.get(key.as_bytes())? {
            let previous: Activity = Self::deserialize(&raw)?;
            let previous_filter_key = keys::activity_filter_key(
                previous.stage,
                &previous.subject,
                &previous.lesson,
                &previous.id,
            );
            if previous_filter_key != filter_key {
                self.activity_filter_index
                    .remove(previous_filter_key.as_bytes())?;
            }
        }

        self.activities
            .insert(key.as_bytes(), Self::serialize(activity)?)?;
        self.activity_filter_index
            .insert(filter_key.as_bytes(), activity.id.as_bytes())?;
        Ok(())
    }

    pub fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, StoreError> {
        let key = keys::activity_key(activity_id);
        match self.activities.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// 按学段 + 学科（可选课时）做前缀扫描。无匹配返回空集，不报错。
    /// 结果按 id 升序，保证下游排序拿到确定性的输入。
    pub fn find_activities(
        &self,
        stage: Stage,
        subject: &str,
        lesson: Option<&str>,
    ) -> Result<Vec<Activity>, StoreError> {
        let prefix = keys::activity_filter_prefix(stage, subject, lesson);
        let mut matches = Vec::new();
        for item in self.activity_filter_index.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            let activity_id = String::from_utf8(value.to_vec()).unwrap_or_default();
            // Index entries are rebuildable; tolerate an orphan rather than fail the scan.
            if let Some(activity) = self.get_activity(&activity_id)? {
                matches.push(activity);
            }
        }
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }

    /// Optimistic compare-and-swap update of a single activity's statistics.
    /// Concurrent updates to the same record retry instead of losing
    /// increments; a full conflict storm surfaces as CasRetryExhausted.
    pub fn update_statistics(
        &self,
        activity_id: &str,
        outcome: &Outcome,
    ) -> Result<Activity, StoreError> {
        let key = keys::activity_key(activity_id);

        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.activities.get(key.as_bytes())?.ok_or_else(|| {
                StoreError::NotFound {
                    entity: "activity".to_string(),
                    key: activity_id.to_string(),
                }
            })?;

            let mut activity: Activity = Self::deserialize(&current)?;
            activity.record_outcome(outcome);
            let next = Self::serialize(&activity)?;

            match self
                .activities
                .compare_and_swap(key.as_bytes(), Some(&current), Some(next))?
            {
                Ok(()) => return Ok(activity),
                Err(_) => continue,
            }
        }

        Err(StoreError::CasRetryExhausted {
            entity: "activity".to_string(),
            key: activity_id.to_string(),
            attempts: MAX_CAS_ATTEMPTS,
        })
    }

    pub fn list_activities(&self, limit: usize, offset: usize) -> Result<Vec<Activity>, StoreError> {
        let mut activities = Vec::new();
        let mut skipped = 0usize;
        for item in self.activities.iter() {
            let (_, value) = item?;
            if skipped < offset {
                skipped += 1;
                continue;
            }
            activities.push(Self::deserialize::<Activity>(&value)?);
            if activities.len() >= limit {
                break;
            }
        }
        Ok(activities)
    }

    pub fn count_activities(&self) -> Result<u64, StoreError> {
        Ok(self.activities.len() as u64)
    }

    /// Removes the catalog record and its index entry. Interaction history
    /// referencing the activity is append-only and stays untouched.
    pub fn delete_activity(&self, activity_id: &str) -> Result<(), StoreError> {
        let key = keys::activity_key(activity_id);
        let activity = self
            .get_activity(activity_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "activity".to_string(),
                key: activity_id.to_string(),
            })?;

        let filter_key = keys::activity_filter_key(
            activity.stage,
            &activity.subject,
            &activity.lesson,
            &activity.id,
        );
        self.activities.remove(key.as_bytes())?;
        self.activity_filter_index.remove(filter_key.as_bytes())?;
        Ok(())
    }
}
