use chrono::{TimeZone, Utc};
use tasklist_core::db::open_db_in_memory;
use tasklist_core::{
    DbError, DbHandle, Priority, RepoError, SqliteTaskRepository, Task, TaskRepository,
    TaskValidationError,
};

fn repo() -> (DbHandle, SqliteTaskRepository) {
    let db = DbHandle::new(open_db_in_memory().unwrap());
    let repo = SqliteTaskRepository::try_new(db.clone()).unwrap();
    (db, repo)
}

fn sample(id: &str, title: &str) -> Task {
    Task::with_id(id, title)
        .with_description("details")
        .with_due_date(Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap())
        .with_priority(Priority::MEDIUM)
}

#[test]
fn insert_and_get_roundtrip_preserves_fields() {
    let (_db, repo) = repo();
    let task = sample("t1", "Buy milk");
    repo.insert_task(&task).unwrap();

    assert_eq!(repo.get_task("t1").unwrap(), Some(task));
    assert_eq!(repo.get_task("missing").unwrap(), None);
}

#[test]
fn insert_duplicate_id_returns_duplicate_error() {
    let (_db, repo) = repo();
    repo.insert_task(&sample("t1", "Buy milk")).unwrap();

    let err = repo.insert_task(&sample("t1", "Other")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateId(id) if id == "t1"));
}

#[test]
fn other_constraint_violations_are_not_reported_as_duplicate_id() {
    let (db, repo) = repo();
    db.with_conn(|conn| {
        conn.execute_batch("CREATE UNIQUE INDEX tasks_title_unique ON tasks(title);")
            .map_err(DbError::from)
    })
    .unwrap();
    repo.insert_task(&sample("t1", "Buy milk")).unwrap();

    let err = repo.insert_task(&sample("t2", "Buy milk")).unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))), "{err:?}");
    assert_eq!(repo.list_tasks().unwrap().len(), 1);
}

#[test]
fn update_replaces_whole_record() {
    let (_db, repo) = repo();
    let mut task = sample("t1", "Buy milk");
    repo.insert_task(&task).unwrap();

    task.title = "Buy oat milk".to_string();
    task.description = String::new();
    task.due_date = None;
    task.priority = Priority::HIGH;
    task.is_completed = true;
    repo.update_task(&task).unwrap();

    assert_eq!(repo.get_task("t1").unwrap(), Some(task));
}

#[test]
fn update_and_delete_of_missing_id_return_not_found() {
    let (_db, repo) = repo();

    let err = repo.update_task(&sample("ghost", "x")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "ghost"));
    let err = repo.delete_task("ghost").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "ghost"));
}

#[test]
fn blank_title_is_rejected_before_sql() {
    let (_db, repo) = repo();
    let err = repo.insert_task(&Task::with_id("t1", "")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::EmptyTitle)
    ));
    assert!(repo.list_tasks().unwrap().is_empty());
}

#[test]
fn list_returns_insertion_order_even_after_updates() {
    let (_db, repo) = repo();
    for (id, title) in [("b", "second"), ("a", "first"), ("c", "third")] {
        repo.insert_task(&Task::with_id(id, title)).unwrap();
    }
    repo.update_task(&Task::with_id("b", "second, edited")).unwrap();

    let ids = repo
        .list_tasks()
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn search_is_case_sensitive_substring_without_wildcards() {
    let (_db, repo) = repo();
    repo.insert_task(&Task::with_id("1", "Buy milk")).unwrap();
    repo.insert_task(&Task::with_id("2", "Clean house")).unwrap();
    repo.insert_task(&Task::with_id("3", "MILK run")).unwrap();
    repo.insert_task(&Task::with_id("4", "100% done")).unwrap();

    let titles = |text: &str| {
        repo.search_by_title(text)
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect::<Vec<_>>()
    };

    assert_eq!(titles("milk"), vec!["Buy milk"]);
    assert_eq!(titles("MILK"), vec!["MILK run"]);
    assert_eq!(titles("%"), vec!["100% done"]);
    assert_eq!(titles("_"), Vec::<String>::new());
}

#[test]
fn legacy_row_shapes_are_read_leniently() {
    let (db, repo) = repo();
    db.with_conn(|conn| {
        conn.execute_batch(
            "INSERT INTO tasks (id, title, description, isCompleted, dueDate, priority)
             VALUES ('old', 'Legacy', NULL, 0, '2024-03-09T14:30:00.000', NULL);
             INSERT INTO tasks (id, title, description, isCompleted, dueDate, priority)
             VALUES ('odd', 'Odd priority', '', 1, NULL, 9);",
        )
        .map_err(DbError::from)
    })
    .unwrap();

    let legacy = repo.get_task("old").unwrap().unwrap();
    assert_eq!(legacy.description, "");
    assert_eq!(legacy.priority, Priority::LOW);
    assert_eq!(
        legacy.due_date,
        Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap())
    );

    let odd = repo.get_task("odd").unwrap().unwrap();
    assert_eq!(odd.priority.label(), "Unknown");
    assert!(odd.is_completed);
    assert_eq!(odd.due_date, None);
}

#[test]
fn unparseable_due_date_is_reported_as_invalid_data() {
    let (db, repo) = repo();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tasks (id, title, isCompleted, dueDate) VALUES ('x', 'x', 0, 'soon');",
            [],
        )
        .map_err(DbError::from)
    })
    .unwrap();

    let err = repo.list_tasks().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("dueDate")));
}
