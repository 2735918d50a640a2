use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use activity_recommender::engine::config::RecommenderConfig;
use activity_recommender::engine::RecommenderEngine;
use activity_recommender::store::operations::activities::{Activity, Stage};
use activity_recommender::store::Store;

pub struct TestHarness {
    pub engine: Arc<RecommenderEngine>,
    pub store: Arc<Store>,
    _temp_dir: TempDir,
}

pub fn spawn() -> TestHarness {
    spawn_with_config(RecommenderConfig::default())
}

pub fn spawn_with_config(config: RecommenderConfig) -> TestHarness {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("recommender-test.sled");

    let store = Arc::new(Store::open(sled_path.to_str().expect("utf8 path")).expect("open store"));
    store.run_migrations().expect("run migrations");

    let engine = Arc::new(RecommenderEngine::new(config, store.clone()));

    TestHarness {
        engine,
        store,
        _temp_dir: temp_dir,
    }
}

pub fn activity(id: &str, stage: Stage, subject: &str, lesson: &str) -> Activity {
    Activity {
        id: id.to_string(),
        stage,
        subject: subject.to_string(),
        lesson: lesson.to_string(),
        description: format!("description of {id}"),
        exercises: format!("exercises of {id}"),
        application: format!("application of {id}"),
        usage_count: 0,
        success_count: 0,
        total_rating: 0,
        created_at: Utc::now(),
    }
}

pub fn activity_with_stats(
    id: &str,
    stage: Stage,
    subject: &str,
    lesson: &str,
    usage_count: u64,
    success_count: u64,
    total_rating: u64,
) -> Activity {
    let mut seeded = activity(id, stage, subject, lesson);
    seeded.usage_count = usage_count;
    seeded.success_count = success_count;
    seeded.total_rating = total_rating;
    seeded
}
