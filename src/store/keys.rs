use crate::store::operations::activities::Stage;

pub fn activity_key(activity_id: &str) -> String {
    activity_id.to_string()
}

/// 过滤索引键：stage:subject:lesson:activity_id，值存 activity_id。
/// 末尾带上 id 保证同一课时下多个活动互不覆盖。
pub fn activity_filter_key(
    stage: Stage,
    subject: &str,
    lesson: &str,
    activity_id: &str,
) -> String {
    format!("{}:{}:{}:{}", stage.as_str(), subject, lesson, activity_id)
}

/// Prefix for candidate lookup. Omitting the lesson broadens the scan to the
/// whole subject; the trailing colon keeps "math" from matching "mathematics".
pub fn activity_filter_prefix(stage: Stage, subject: &str, lesson: Option<&str>) -> String {
    match lesson {
        Some(lesson) => format!("{}:{}:{}:", stage.as_str(), subject, lesson),
        None => format!("{}:{}:", stage.as_str(), subject),
    }
}

pub fn interaction_key(learner_id: &str, timestamp_ms: i64, event_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", learner_id, reverse_ts, event_id)
}

pub fn interaction_prefix(learner_id: &str) -> String {
    format!("{}:", learner_id)
}
