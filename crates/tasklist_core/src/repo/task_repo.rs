//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/update/delete/scan/search over the `tasks` table.
//! - Keep SQL and due-date text encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Scans return rows in storage-native order (`rowid` ascending).
//! - Title search is a case-sensitive substring match.

use crate::db::{DbError, DbHandle};
use crate::model::task::{Priority, Task, TaskId, TaskValidationError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    isCompleted,
    dueDate,
    priority
FROM tasks";

const TASK_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "isCompleted",
    "dueDate",
    "priority",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task and preference persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    DuplicateId(TaskId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::DuplicateId(id) => write!(f, "task id already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: expected schema {expected_version}, found {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the persistent task table.
pub trait TaskRepository {
    /// Inserts a new row; an existing id yields `RepoError::DuplicateId`.
    fn insert_task(&self, task: &Task) -> RepoResult<()>;
    /// Whole-record replace by id; zero affected rows yields `NotFound`.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Deletes by id; zero affected rows yields `NotFound`.
    fn delete_task(&self, id: &str) -> RepoResult<()>;
    fn get_task(&self, id: &str) -> RepoResult<Option<Task>>;
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn search_by_title(&self, text: &str) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository over the shared connection.
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    db: DbHandle,
}

impl SqliteTaskRepository {
    /// Constructs a repository from a migrated connection handle.
    pub fn try_new(db: DbHandle) -> RepoResult<Self> {
        db.with_conn(|conn| super::ensure_schema(conn, "tasks", TASK_COLUMNS))?;
        Ok(Self { db })
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        self.db.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO tasks (
                    id,
                    title,
                    description,
                    isCompleted,
                    dueDate,
                    priority
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    task.id.as_str(),
                    task.title.as_str(),
                    task.description.as_str(),
                    bool_to_int(task.is_completed),
                    task.due_date.map(format_due_date),
                    task.priority.ordinal(),
                ],
            );
            match result {
                Ok(_) => Ok(()),
                Err(err) if is_primary_key_violation(&err) => {
                    Err(RepoError::DuplicateId(task.id.clone()))
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks
                 SET
                    title = ?1,
                    description = ?2,
                    isCompleted = ?3,
                    dueDate = ?4,
                    priority = ?5
                 WHERE id = ?6;",
                params![
                    task.title.as_str(),
                    task.description.as_str(),
                    bool_to_int(task.is_completed),
                    task.due_date.map(format_due_date),
                    task.priority.ordinal(),
                    task.id.as_str(),
                ],
            )
            .map_err(RepoError::from)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id.clone()));
        }

        Ok(())
    }

    fn delete_task(&self, id: &str) -> RepoResult<()> {
        let changed = self.db.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])
                .map_err(RepoError::from)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        self.db.with_conn(|conn| -> RepoResult<Option<Task>> {
            let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_task_row(row)?));
            }
            Ok(None)
        })
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.db.with_conn(|conn| {
            query_tasks(conn, &format!("{TASK_SELECT_SQL} ORDER BY rowid ASC;"), None)
        })
    }

    fn search_by_title(&self, text: &str) -> RepoResult<Vec<Task>> {
        // `instr` rather than LIKE: LIKE folds ASCII case and treats `%`/`_`
        // in user input as wildcards.
        self.db.with_conn(|conn| {
            query_tasks(
                conn,
                &format!("{TASK_SELECT_SQL} WHERE instr(title, ?1) > 0 ORDER BY rowid ASC;"),
                Some(text),
            )
        })
    }
}

fn query_tasks(conn: &Connection, sql: &str, bind: Option<&str>) -> RepoResult<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = match bind {
        Some(value) => stmt.query([value])?,
        None => stmt.query([])?,
    };

    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: String = row.get("id")?;

    let is_completed = match row.get::<_, i64>("isCompleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid isCompleted value `{other}` in tasks.isCompleted for `{id}`"
            )));
        }
    };

    let due_date = match row.get::<_, Option<String>>("dueDate")? {
        Some(text) => Some(parse_due_date(&text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid dueDate value `{text}` in tasks.dueDate for `{id}`"
            ))
        })?),
        None => None,
    };

    Ok(Task {
        title: row.get("title")?,
        description: row
            .get::<_, Option<String>>("description")?
            .unwrap_or_default(),
        due_date,
        priority: row
            .get::<_, Option<i64>>("priority")?
            .map_or(Priority::LOW, Priority),
        is_completed,
        id,
    })
}

/// Encodes a due date as RFC 3339 UTC.
///
/// Sub-second digits are written only as far as needed, so the stored text
/// decodes back to the exact in-memory instant.
pub fn format_due_date(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Decodes the ISO-ish due-date text accepted in `tasks.dueDate`.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` timestamp (read as
/// UTC), or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_due_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.with_timezone(&Utc));
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(value.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{format_due_date, parse_due_date};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn due_date_text_accepts_rfc3339_naive_and_date_only() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(parse_due_date("2024-03-09T14:30:00.000Z"), Some(expected));
        assert_eq!(parse_due_date("2024-03-09T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_due_date("2024-03-09T14:30:00.000"), Some(expected));
        assert_eq!(
            parse_due_date("2024-03-09"),
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_due_date("next tuesday"), None);
    }

    #[test]
    fn format_due_date_is_parseable() {
        let value = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_due_date(value), "2030-01-02T03:04:05Z");
    }

    #[test]
    fn format_due_date_keeps_sub_millisecond_digits() {
        let value = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()
            + Duration::nanoseconds(123_456_789);
        let text = format_due_date(value);
        assert_eq!(text, "2030-01-02T03:04:05.123456789Z");
        assert_eq!(parse_due_date(&text), Some(value));
    }
}
