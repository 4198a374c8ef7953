use std::sync::{Arc, Mutex};
use tasklist_core::db::{open_db, open_db_in_memory};
use tasklist_core::repo::preference_repo::PREFERENCES_KEY;
use tasklist_core::{
    DbError, DbHandle, PreferenceAdapter, PreferenceRepository, SortOrder,
    SqlitePreferenceRepository, StoreError, UserPreferences,
};

fn adapter(db: &DbHandle) -> PreferenceAdapter<SqlitePreferenceRepository> {
    PreferenceAdapter::new(SqlitePreferenceRepository::try_new(db.clone()).unwrap())
}

fn stored_value(db: &DbHandle) -> Option<String> {
    db.with_conn(|conn| -> Result<Option<String>, DbError> {
        let mut stmt = conn.prepare("SELECT value FROM preferences WHERE key = ?1;")?;
        let mut rows = stmt.query([PREFERENCES_KEY])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    })
    .unwrap()
}

fn record_published(
    prefs: &mut PreferenceAdapter<SqlitePreferenceRepository>,
) -> Arc<Mutex<Vec<UserPreferences>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    prefs.subscribe(move |value: &UserPreferences| sink.lock().unwrap().push(*value));
    seen
}

#[test]
fn first_load_materializes_and_persists_defaults() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    assert_eq!(stored_value(&db), None);

    let prefs = adapter(&db).load().unwrap();
    assert_eq!(prefs, UserPreferences::default());
    assert_eq!(
        stored_value(&db).as_deref(),
        Some(r#"{"isDarkMode":false,"sortOrder":"date"}"#)
    );
}

#[test]
fn set_replaces_whole_record_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.db");

    {
        let db = DbHandle::new(open_db(&path).unwrap());
        let mut prefs = adapter(&db);
        prefs
            .set(UserPreferences {
                is_dark_mode: true,
                sort_order: SortOrder::Priority,
            })
            .unwrap();
    }

    let db = DbHandle::new(open_db(&path).unwrap());
    let loaded = adapter(&db).load().unwrap();
    assert!(loaded.is_dark_mode);
    assert_eq!(loaded.sort_order, SortOrder::Priority);
}

#[test]
fn load_reads_storage_once_then_serves_memory() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    let mut prefs = adapter(&db);
    prefs.load().unwrap();

    SqlitePreferenceRepository::try_new(db.clone())
        .unwrap()
        .save_preferences(&UserPreferences {
            is_dark_mode: true,
            sort_order: SortOrder::Date,
        })
        .unwrap();

    assert!(!prefs.get().unwrap().is_dark_mode);
}

#[test]
fn toggle_dark_mode_and_set_sort_order_publish_changes() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    let mut prefs = adapter(&db);
    let seen = record_published(&mut prefs);

    let toggled = prefs.toggle_dark_mode().unwrap();
    assert!(toggled.is_dark_mode);
    let sorted = prefs.set_sort_order(SortOrder::Priority).unwrap();
    assert!(sorted.is_dark_mode);
    assert_eq!(sorted.sort_order, SortOrder::Priority);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first(), Some(&UserPreferences::default()));
    assert_eq!(seen.last(), Some(&sorted));
    assert_eq!(seen.len(), 3);
}

#[test]
fn failed_set_restores_previous_record() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    let mut prefs = adapter(&db);
    let before = prefs.load().unwrap();

    db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE preferences;")
            .map_err(DbError::from)
    })
    .unwrap();

    let err = prefs
        .set(UserPreferences {
            is_dark_mode: true,
            sort_order: SortOrder::Priority,
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Repo(_)));
    assert_eq!(prefs.get().unwrap(), before);
}

#[test]
fn failed_set_before_load_republishes_stored_record() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    let stored = UserPreferences {
        is_dark_mode: true,
        sort_order: SortOrder::Date,
    };
    adapter(&db).set(stored).unwrap();
    db.with_conn(|conn| {
        conn.execute_batch(
            "CREATE TRIGGER prefs_no_insert BEFORE INSERT ON preferences
             BEGIN SELECT RAISE(ABORT, 'read-only'); END;
             CREATE TRIGGER prefs_no_update BEFORE UPDATE ON preferences
             BEGIN SELECT RAISE(ABORT, 'read-only'); END;",
        )
        .map_err(DbError::from)
    })
    .unwrap();

    let mut prefs = adapter(&db);
    let seen = record_published(&mut prefs);
    let rejected = UserPreferences {
        is_dark_mode: false,
        sort_order: SortOrder::Priority,
    };
    assert!(matches!(prefs.set(rejected), Err(StoreError::Repo(_))));

    assert_eq!(*seen.lock().unwrap(), vec![rejected, stored]);
    assert_eq!(prefs.get().unwrap(), stored);
}

#[test]
fn failed_set_before_load_with_unreadable_storage_republishes_defaults() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    let mut prefs = adapter(&db);
    let seen = record_published(&mut prefs);
    db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE preferences;")
            .map_err(DbError::from)
    })
    .unwrap();

    let rejected = UserPreferences {
        is_dark_mode: true,
        sort_order: SortOrder::Priority,
    };
    assert!(prefs.set(rejected).is_err());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![rejected, UserPreferences::default()]
    );
}

#[test]
fn corrupt_stored_value_is_reported() {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, '{\"isDarkMode\":1}');",
            [PREFERENCES_KEY],
        )
        .map_err(DbError::from)
    })
    .unwrap();

    assert!(adapter(&db).load().is_err());
}
