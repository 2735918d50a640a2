use crate::store::keys;
use crate::store::operations::activities::Activity;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_activity_filter_index", m002_activity_filter_index),
    ]
}

/// 执行所有未应用的迁移。
///
/// - 每个迁移必须幂等：func() 成功但 set_version() 前崩溃会导致重启后重跑。
/// - 版本号在每个迁移成功后立即落盘，已完成的不再重复。
/// - 仅向前：set_version 拒绝降级。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().unwrap_or([0; 4]);
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuild the filter index from primary activity records. Index entries are
/// derivable, so re-inserting existing keys is harmless.
fn m002_activity_filter_index(store: &Store) -> Result<(), StoreError> {
    for item in store.activities.iter() {
        let (_, value) = item?;
        let activity: Activity = Store::deserialize(&value)?;

        let filter_key = keys::activity_filter_key(
            activity.stage,
            &activity.subject,
            &activity.lesson,
            &activity.id,
        );
        store
            .activity_filter_index
            .insert(filter_key.as_bytes(), activity.id.as_bytes())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn downgrade_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db2");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }

    #[test]
    fn filter_index_is_rebuilt_from_records() {
        use crate::store::operations::activities::{Activity, Stage};
        use chrono::Utc;

        let dir = tempdir().unwrap();
        let path = dir.path().join("db3");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        let activity = Activity {
            id: "a1".to_string(),
            stage: Stage::Primary,
            subject: "math".to_string(),
            lesson: "fractions".to_string(),
            description: String::new(),
            exercises: String::new(),
            application: String::new(),
            usage_count: 0,
            success_count: 0,
            total_rating: 0,
            created_at: Utc::now(),
        };
        store.upsert_activity(&activity).unwrap();

        // Simulate an index lost ahead of the rebuild migration.
        store.activity_filter_index.clear().unwrap();
        assert!(store
            .find_activities(Stage::Primary, "math", None)
            .unwrap()
            .is_empty());

        m002_activity_filter_index(&store).unwrap();
        assert_eq!(
            store
                .find_activities(Stage::Primary, "math", None)
                .unwrap()
                .len(),
            1
        );
    }
}
