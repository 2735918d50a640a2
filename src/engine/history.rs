//! 历史回退建议：统计学习者日志中出现最多的 (学段, 学科, 课时) 三元组。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::operations::activities::Stage;
use crate::store::operations::interactions::InteractionEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyFocus {
    pub stage: Stage,
    pub subject: String,
    pub lesson: String,
    pub occurrences: u64,
    pub last_seen_at: DateTime<Utc>,
}

/// Most frequent triple by occurrence count. Equal counts resolve to the most
/// recent occurrence; equal counts and timestamps resolve to the smallest
/// triple so the result is total. Returns None for an empty history.
pub fn most_frequent_focus(events: &[InteractionEvent]) -> Option<StudyFocus> {
    let mut tally: HashMap<(Stage, &str, &str), (u64, DateTime<Utc>)> = HashMap::new();

    for event in events {
        let entry = tally
            .entry((event.stage, event.subject.as_str(), event.lesson.as_str()))
            .or_insert((0, event.created_at));
        entry.0 += 1;
        if event.created_at > entry.1 {
            entry.1 = event.created_at;
        }
    }

    tally
        .into_iter()
        .max_by(|a, b| {
            let (a_triple, (a_count, a_last)) = a;
            let (b_triple, (b_count, b_last)) = b;
            a_count
                .cmp(b_count)
                .then_with(|| a_last.cmp(b_last))
                // Reversed triple comparison: the smaller triple ranks greater.
                .then_with(|| {
                    (b_triple.0.as_str(), b_triple.1, b_triple.2)
                        .cmp(&(a_triple.0.as_str(), a_triple.1, a_triple.2))
                })
        })
        .map(
            |((stage, subject, lesson), (occurrences, last_seen_at))| StudyFocus {
                stage,
                subject: subject.to_string(),
                lesson: lesson.to_string(),
                occurrences,
                last_seen_at,
            },
        )
}
