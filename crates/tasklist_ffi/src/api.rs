//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level task and preference functions to Dart.
//! - Own the single process-wide app state (DB handle, stores, outbox).
//! - Hand queued notification commands to the Dart notification plugin.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call is serialized through one app-state lock.
//! - Timestamps cross the boundary as Unix epoch milliseconds.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tasklist_core::db::open_db;
use tasklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DbHandle, NotificationCommand, NotificationOutbox, PreferenceAdapter, Priority,
    SortOrder, SqlitePreferenceRepository, SqliteTaskRepository, Task, TaskStore,
    UserPreferences,
};

const APP_DB_FILE_NAME: &str = "tasklist.sqlite3";
const APP_DB_PATH_ENV: &str = "TASKLIST_DB_PATH";

static APP: OnceLock<Mutex<AppState>> = OnceLock::new();

struct AppState {
    db_path: PathBuf,
    tasks: TaskStore<SqliteTaskRepository, Arc<NotificationOutbox>>,
    prefs: PreferenceAdapter<SqlitePreferenceRepository>,
    outbox: Arc<NotificationOutbox>,
}

impl AppState {
    fn open(db_path: PathBuf) -> Result<Self, String> {
        let conn = open_db(&db_path).map_err(|err| format!("app DB open failed: {err}"))?;
        let db = DbHandle::new(conn);
        let task_repo = SqliteTaskRepository::try_new(db.clone())
            .map_err(|err| format!("task repo init failed: {err}"))?;
        let pref_repo = SqlitePreferenceRepository::try_new(db)
            .map_err(|err| format!("preference repo init failed: {err}"))?;

        let outbox = Arc::new(NotificationOutbox::new());
        let mut tasks = TaskStore::new(task_repo, Arc::clone(&outbox));
        let mut prefs = PreferenceAdapter::new(pref_repo);

        let preferences = prefs
            .load()
            .map_err(|err| format!("preferences load failed: {err}"))?;
        tasks
            .load()
            .map_err(|err| format!("tasks load failed: {err}"))?;
        tasks.sort_by(preferences.sort_order);

        info!(
            "event=app_init module=ffi status=ok task_count={}",
            tasks.len()
        );
        Ok(Self {
            db_path,
            tasks,
            prefs,
            outbox,
        })
    }
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Opens the app database and loads both stores.
///
/// Blank `db_path` falls back to `TASKLIST_DB_PATH`, then the temp dir.
/// Repeating the call with the same path is a no-op; a different path is
/// rejected. Returns an empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn app_init(db_path: String) -> String {
    match ensure_app(resolve_db_path(db_path.as_str())) {
        Ok(_) => String::new(),
        Err(err) => err,
    }
}

/// Task shape shared with Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub due_date_ms: Option<i64>,
    pub priority: i64,
    /// `Low|Medium|High|Unknown`.
    pub priority_label: String,
    pub is_completed: bool,
}

/// Input for creating a task; the id is generated by core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date_ms: Option<i64>,
    pub priority: i64,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    pub item: Option<TaskItem>,
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, item: Option<TaskItem>) -> Self {
        Self {
            ok: true,
            item,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesResponse {
    pub ok: bool,
    pub is_dark_mode: bool,
    /// `date|priority`.
    pub sort_order: String,
    pub message: String,
}

/// Notification command for the Dart plugin wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    /// `schedule|cancel`.
    pub action: String,
    pub id: i32,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds; `0` for cancel.
    pub fire_at_ms: i64,
    pub fire_immediately: bool,
}

/// Reloads every task from storage.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_load() -> TaskListResponse {
    list_response("tasks_load", |app| {
        app.tasks.load().map_err(|err| err.to_string())
    })
}

/// Replaces the visible list with tasks whose title contains `text`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_search(text: String) -> TaskListResponse {
    list_response("tasks_search", |app| {
        app.tasks
            .search_by_title(text.as_str())
            .map_err(|err| err.to_string())
    })
}

/// Reorders the visible list; unknown criteria leave it unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_sort(criterion: String) -> TaskListResponse {
    list_response("tasks_sort", |app| {
        app.tasks.sort(criterion.trim());
        Ok(())
    })
}

/// Creates a task with a generated id.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(draft: TaskDraft) -> TaskActionResponse {
    let result = draft_to_task(draft).and_then(|task| {
        with_app(|app| {
            app.tasks
                .add(task.clone())
                .map(|()| task)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(task) => TaskActionResponse::success("Task created.", Some(to_task_item(&task))),
        Err(err) => TaskActionResponse::failure(format!("task_add failed: {err}")),
    }
}

/// Replaces one task record.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(item: TaskItem) -> TaskActionResponse {
    let result = item_to_task(item).and_then(|task| {
        with_app(|app| {
            app.tasks
                .update(task.clone())
                .map(|()| task)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(task) => TaskActionResponse::success("Task updated.", Some(to_task_item(&task))),
        Err(err) => TaskActionResponse::failure(format!("task_update failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    match with_app(|app| app.tasks.delete(id.as_str()).map_err(|err| err.to_string())) {
        Ok(()) => TaskActionResponse::success("Task deleted.", None),
        Err(err) => TaskActionResponse::failure(format!("task_delete failed: {err}")),
    }
}

/// Flips completion of `item` and queues the matching notifications.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(item: TaskItem) -> TaskActionResponse {
    let result = item_to_task(item).and_then(|task| {
        with_app(|app| {
            app.tasks
                .toggle_completion(&task)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(task) => {
            let message = if task.is_completed {
                "Task completed."
            } else {
                "Task reopened."
            };
            TaskActionResponse::success(message, Some(to_task_item(&task)))
        }
        Err(err) => TaskActionResponse::failure(format!("task_toggle failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn prefs_get() -> PreferencesResponse {
    match with_app(|app| app.prefs.get().map_err(|err| err.to_string())) {
        Ok(prefs) => preferences_response(prefs, "OK"),
        Err(err) => preferences_failure(format!("prefs_get failed: {err}")),
    }
}

/// Replaces the preference record and re-sorts the list by the new order.
#[flutter_rust_bridge::frb(sync)]
pub fn prefs_set(is_dark_mode: bool, sort_order: String) -> PreferencesResponse {
    let Some(sort_order) = SortOrder::parse(sort_order.trim()) else {
        return preferences_failure(format!(
            "prefs_set failed: unsupported sort order `{}`; expected date|priority",
            sort_order.trim()
        ));
    };
    let preferences = UserPreferences {
        is_dark_mode,
        sort_order,
    };

    let result = with_app(|app| {
        app.prefs
            .set(preferences)
            .map_err(|err| err.to_string())?;
        app.tasks.sort_by(preferences.sort_order);
        Ok(())
    });
    match result {
        Ok(()) => preferences_response(preferences, "Preferences saved."),
        Err(err) => preferences_failure(format!("prefs_set failed: {err}")),
    }
}

/// Takes every queued notification command in issue order.
///
/// Returns an empty list when the app is not initialized.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_drain() -> Vec<NotificationItem> {
    with_app(|app| Ok(app.outbox.drain()))
        .unwrap_or_default()
        .into_iter()
        .map(to_notification_item)
        .collect()
}

fn list_response(
    operation: &'static str,
    f: impl FnOnce(&mut AppState) -> Result<(), String>,
) -> TaskListResponse {
    let result = with_app(|app| {
        f(app)?;
        Ok(app.tasks.tasks().iter().map(to_task_item).collect::<Vec<_>>())
    });
    match result {
        Ok(items) => TaskListResponse {
            ok: true,
            message: format!("{} task(s).", items.len()),
            items,
        },
        Err(err) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn with_app<T>(f: impl FnOnce(&mut AppState) -> Result<T, String>) -> Result<T, String> {
    let app = match APP.get() {
        Some(app) => app,
        None => ensure_app(resolve_db_path(""))?,
    };
    let mut guard = app
        .lock()
        .map_err(|_| "app state is poisoned".to_string())?;
    f(&mut guard)
}

/// Returns the app state, opening it at `db_path` on first use.
fn ensure_app(db_path: PathBuf) -> Result<&'static Mutex<AppState>, String> {
    if let Some(app) = APP.get() {
        return check_same_path(app, &db_path).map(|()| app);
    }

    let state = AppState::open(db_path.clone())?;
    if APP.set(Mutex::new(state)).is_err() {
        warn!("event=app_init module=ffi status=skipped reason=concurrent_init");
    }
    let app = APP
        .get()
        .ok_or_else(|| "app state unavailable after init".to_string())?;
    check_same_path(app, &db_path).map(|()| app)
}

fn check_same_path(app: &Mutex<AppState>, db_path: &Path) -> Result<(), String> {
    let guard = app
        .lock()
        .map_err(|_| "app state is poisoned".to_string())?;
    if guard.db_path == db_path {
        return Ok(());
    }
    Err(format!(
        "app already initialized at `{}`; refusing to switch to `{}`",
        guard.db_path.display(),
        db_path.display()
    ))
}

/// Explicit path first, then the env override, then the temp dir.
fn resolve_db_path(requested: &str) -> PathBuf {
    let requested = requested.trim();
    if !requested.is_empty() {
        return PathBuf::from(requested);
    }
    if let Ok(raw) = std::env::var(APP_DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(APP_DB_FILE_NAME)
}

fn draft_to_task(draft: TaskDraft) -> Result<Task, String> {
    let mut task = Task::new(draft.title.trim())
        .with_description(draft.description)
        .with_priority(Priority(draft.priority));
    task.due_date = draft.due_date_ms.map(from_epoch_ms).transpose()?;
    Ok(task)
}

fn item_to_task(item: TaskItem) -> Result<Task, String> {
    Ok(Task {
        due_date: item.due_date_ms.map(from_epoch_ms).transpose()?,
        id: item.id,
        title: item.title.trim().to_string(),
        description: item.description,
        priority: Priority(item.priority),
        is_completed: item.is_completed,
    })
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        due_date_ms: task.due_date.map(|due| due.timestamp_millis()),
        priority: task.priority.ordinal(),
        priority_label: task.priority.label().to_string(),
        is_completed: task.is_completed,
    }
}

fn to_notification_item(command: NotificationCommand) -> NotificationItem {
    match command {
        NotificationCommand::Schedule(request) => NotificationItem {
            action: "schedule".to_string(),
            id: request.id.0,
            title: request.title,
            body: request.body,
            fire_at_ms: request.fire_at.timestamp_millis(),
            fire_immediately: request.fire_immediately,
        },
        NotificationCommand::Cancel(id) => NotificationItem {
            action: "cancel".to_string(),
            id: id.0,
            title: String::new(),
            body: String::new(),
            fire_at_ms: 0,
            fire_immediately: false,
        },
    }
}

fn from_epoch_ms(value: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| format!("due date `{value}` is out of range"))
}

fn preferences_response(prefs: UserPreferences, message: &str) -> PreferencesResponse {
    PreferencesResponse {
        ok: true,
        is_dark_mode: prefs.is_dark_mode,
        sort_order: prefs.sort_order.as_str().to_string(),
        message: message.to_string(),
    }
}

fn preferences_failure(message: String) -> PreferencesResponse {
    let defaults = UserPreferences::default();
    PreferencesResponse {
        ok: false,
        is_dark_mode: defaults.is_dark_mode,
        sort_order: defaults.sort_order.as_str().to_string(),
        message,
    }
}
