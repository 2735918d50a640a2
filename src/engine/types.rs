use serde::{Deserialize, Serialize};

use crate::store::operations::activities::Stage;
use crate::store::operations::interactions::ActivityKind;

/// Selection criteria supplied by the caller for one request. The engine
/// holds no ambient learner state; everything arrives through this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCriteria {
    pub stage: Stage,
    pub subject: String,
    /// Omitting the lesson broadens the match to the whole subject.
    pub lesson: Option<String>,
}

impl SelectionCriteria {
    pub fn subject_wide(stage: Stage, subject: &str) -> Self {
        Self {
            stage,
            subject: subject.to_string(),
            lesson: None,
        }
    }

    pub fn for_lesson(stage: Stage, subject: &str, lesson: &str) -> Self {
        Self {
            stage,
            subject: subject.to_string(),
            lesson: Some(lesson.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    pub activity_id: String,
    pub learner_id: String,
    pub rating: u8,
    pub success: bool,
    /// Which part of the activity the learner worked through.
    #[serde(default)]
    pub kind: ActivityKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_criteria_carries_the_lesson() {
        let criteria = SelectionCriteria::for_lesson(Stage::Primary, "math", "fractions");
        assert_eq!(criteria.lesson.as_deref(), Some("fractions"));

        let wide = SelectionCriteria::subject_wide(Stage::Primary, "math");
        assert!(wide.lesson.is_none());
    }

    #[test]
    fn outcome_request_kind_defaults_to_exercise() {
        let json = r#"{"activityId":"a1","learnerId":"alice","rating":4,"success":true}"#;
        let request: OutcomeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.kind, ActivityKind::Exercise);
    }
}
