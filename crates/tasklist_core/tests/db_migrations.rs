use rusqlite::Connection;
use tasklist_core::db::migrations::latest_version;
use tasklist_core::db::{open_db, open_db_in_memory, DbError};
use tasklist_core::{
    DbHandle, RepoError, SqlitePreferenceRepository, SqliteTaskRepository, TaskRepository,
};

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid;")
        .unwrap();
    let names = stmt
        .query_map([table], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap();
    names
}

#[test]
fn fresh_database_reaches_latest_version_with_both_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    assert_eq!(
        columns(&conn, "tasks"),
        vec!["id", "title", "description", "isCompleted", "dueDate", "priority"]
    );
    assert_eq!(columns(&conn, "preferences"), vec!["key", "value"]);
}

#[test]
fn version_one_file_gains_preferences_and_keeps_task_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            isCompleted INTEGER NOT NULL DEFAULT 0 CHECK (isCompleted IN (0, 1)),
            dueDate TEXT,
            priority INTEGER
         );
         INSERT INTO tasks (id, title) VALUES ('kept', 'Water plants');
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let db = DbHandle::new(open_db(&path).unwrap());
    SqlitePreferenceRepository::try_new(db.clone()).unwrap();
    let tasks = SqliteTaskRepository::try_new(db).unwrap();
    let titles: Vec<String> = tasks
        .list_tasks()
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["Water plants"]);
}

#[test]
fn reopening_a_migrated_file_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.db");

    drop(open_db(&path).unwrap());
    let reopened = open_db(&path).unwrap();
    assert_eq!(user_version(&reopened), latest_version());
    assert_eq!(columns(&reopened, "preferences"), vec!["key", "value"]);
}

#[test]
fn file_from_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", latest_version() + 1)
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, latest_version() + 1);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connection() {
    let raw = DbHandle::new(Connection::open_in_memory().unwrap());

    let err = SqliteTaskRepository::try_new(raw.clone()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
    assert!(SqlitePreferenceRepository::try_new(raw).is_err());
}
