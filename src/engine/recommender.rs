use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::engine::config::{RecommenderConfig, TieBreak};
use crate::engine::history::{self, StudyFocus};
use crate::engine::metrics::MetricsRegistry;
use crate::engine::policy::{self, ScoringPolicy};
use crate::engine::ranking::{self, RankedActivity};
use crate::engine::types::{OutcomeRequest, SelectionCriteria};
use crate::error::EngineError;
use crate::store::operations::activities::{Activity, Outcome};
use crate::store::operations::interactions::InteractionEvent;
use crate::store::Store;
use crate::validation;

/// 推荐引擎：候选过滤 + 策略评分 + 结果回写的编排层。
/// 自身不持有任何学习者会话状态，所有输入都来自每次调用。
pub struct RecommenderEngine {
    config: Arc<RwLock<RecommenderConfig>>,
    store: Arc<Store>,
    metrics: Arc<MetricsRegistry>,
}

impl RecommenderEngine {
    pub fn new(config: RecommenderConfig, store: Arc<Store>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn reload_config(&self, new_config: RecommenderConfig) -> Result<(), String> {
        new_config.validate()?;
        let mut config = self.config.write().unwrap_or_else(|poison| poison.into_inner());
        *config = new_config;
        tracing::info!("Recommender config reloaded");
        Ok(())
    }

    pub fn get_config(&self) -> RecommenderConfig {
        self.config
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Read-only candidate lookup; an empty result is a plain empty vec.
    pub fn find_candidates(
        &self,
        criteria: &SelectionCriteria,
    ) -> Result<Vec<Activity>, EngineError> {
        validate_criteria(criteria)?;
        Ok(self.store.find_activities(
            criteria.stage,
            &criteria.subject,
            criteria.lesson.as_deref(),
        )?)
    }

    /// Recommends the top candidate under the configured default policy.
    /// `Ok(None)` means nothing matched the criteria; the caller decides how
    /// to present that.
    pub fn recommend(
        &self,
        criteria: &SelectionCriteria,
    ) -> Result<Option<RankedActivity>, EngineError> {
        let config = self.get_config();
        let scoring = policy::from_config(&config);
        self.recommend_inner(criteria, scoring.as_ref(), config.tie_break)
    }

    /// Same as `recommend`, but with a caller-supplied scoring strategy.
    pub fn recommend_with_policy(
        &self,
        criteria: &SelectionCriteria,
        scoring: &dyn ScoringPolicy,
    ) -> Result<Option<RankedActivity>, EngineError> {
        let tie_break = self.get_config().tie_break;
        self.recommend_inner(criteria, scoring, tie_break)
    }

    fn recommend_inner(
        &self,
        criteria: &SelectionCriteria,
        scoring: &dyn ScoringPolicy,
        tie_break: TieBreak,
    ) -> Result<Option<RankedActivity>, EngineError> {
        let start = Instant::now();
        let candidates = self.find_candidates(criteria)?;
        let candidate_count = candidates.len();
        let picked = ranking::best_candidate(candidates, scoring, tie_break);

        let latency_us = start.elapsed().as_micros() as u64;
        self.metrics
            .record_recommend(scoring.id(), latency_us, picked.is_none());

        match &picked {
            Some(ranked) => tracing::debug!(
                stage = %criteria.stage,
                subject = %criteria.subject,
                lesson = criteria.lesson.as_deref(),
                candidate_count,
                activity_id = %ranked.activity.id,
                score = ranked.score,
                policy = scoring.id().as_str(),
                "Recommendation selected"
            ),
            None => tracing::debug!(
                stage = %criteria.stage,
                subject = %criteria.subject,
                lesson = criteria.lesson.as_deref(),
                "No matching activity"
            ),
        }

        Ok(picked)
    }

    /// Fallback suggestion from the learner's own history: the most frequent
    /// (stage, subject, lesson) triple, ties resolved by recency.
    pub fn suggest_from_history(
        &self,
        learner_id: &str,
    ) -> Result<Option<StudyFocus>, EngineError> {
        validation::validate_identifier(learner_id)
            .map_err(|e| EngineError::validation(format!("learner id: {e}")))?;

        let events = self.store.scan_learner_events(learner_id)?;
        let focus = history::most_frequent_focus(&events);

        if let Some(focus) = &focus {
            tracing::debug!(
                learner_id,
                stage = %focus.stage,
                subject = %focus.subject,
                lesson = %focus.lesson,
                occurrences = focus.occurrences,
                "History suggestion computed"
            );
        }

        Ok(focus)
    }

    /// Applies a completed session back onto the chosen activity: statistics
    /// update and log append happen as one atomic unit, or not at all.
    /// Input is validated before anything is written.
    pub fn submit_outcome(&self, request: &OutcomeRequest) -> Result<Activity, EngineError> {
        validation::validate_rating(request.rating).map_err(EngineError::validation)?;
        validation::validate_identifier(&request.learner_id)
            .map_err(|e| EngineError::validation(format!("learner id: {e}")))?;
        validation::validate_identifier(&request.activity_id)
            .map_err(|e| EngineError::validation(format!("activity id: {e}")))?;

        let activity = self
            .store
            .get_activity(&request.activity_id)?
            .ok_or_else(|| EngineError::not_found("activity", &request.activity_id))?;

        let event = InteractionEvent {
            id: Uuid::new_v4().to_string(),
            learner_id: request.learner_id.clone(),
            stage: activity.stage,
            subject: activity.subject.clone(),
            lesson: activity.lesson.clone(),
            activity_id: activity.id.clone(),
            kind: request.kind,
            rating: request.rating,
            success: request.success,
            created_at: Utc::now(),
        };
        let outcome = Outcome {
            rating: request.rating,
            success: request.success,
        };

        let updated = self
            .store
            .apply_outcome(&request.activity_id, &outcome, &event)?;
        self.metrics.record_outcome();

        tracing::info!(
            activity_id = %updated.id,
            learner_id = %request.learner_id,
            rating = request.rating,
            success = request.success,
            usage_count = updated.usage_count,
            "Outcome recorded"
        );

        Ok(updated)
    }
}

fn validate_criteria(criteria: &SelectionCriteria) -> Result<(), EngineError> {
    validation::validate_taxonomy_field(&criteria.subject)
        .map_err(|e| EngineError::validation(format!("subject: {e}")))?;
    if let Some(lesson) = &criteria.lesson {
        validation::validate_taxonomy_field(lesson)
            .map_err(|e| EngineError::validation(format!("lesson: {e}")))?;
    }
    Ok(())
}
