//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tasklist_core` linkage without the Flutter/FFI runtime.
//! - Run one add/load/toggle round trip against a database.
//!
//! Usage: `tasklist_cli [DB_PATH]`; without a path an in-memory DB is used.

use chrono::{Duration, Utc};
use std::error::Error;
use std::sync::Arc;
use tasklist_core::db::{open_db, open_db_in_memory};
use tasklist_core::{
    DbHandle, NotificationCommand, NotificationOutbox, PreferenceAdapter, Priority,
    SqlitePreferenceRepository, SqliteTaskRepository, Task, TaskStore,
};

fn main() {
    println!("tasklist_core ping={}", tasklist_core::ping());
    println!("tasklist_core version={}", tasklist_core::core_version());

    if let Err(err) = run(std::env::args().nth(1)) {
        eprintln!("tasklist_cli error={err}");
        std::process::exit(1);
    }
}

fn run(db_path: Option<String>) -> Result<(), Box<dyn Error>> {
    let conn = match db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let db = DbHandle::new(conn);

    let mut prefs = PreferenceAdapter::new(SqlitePreferenceRepository::try_new(db.clone())?);
    let preferences = prefs.load()?;
    println!(
        "preferences dark_mode={} sort_order={}",
        preferences.is_dark_mode, preferences.sort_order
    );

    let outbox = Arc::new(NotificationOutbox::new());
    let mut store = TaskStore::new(SqliteTaskRepository::try_new(db)?, Arc::clone(&outbox));
    store.load()?;

    let probe = Task::new("CLI smoke probe")
        .with_priority(Priority::MEDIUM)
        .with_due_date(Utc::now() + Duration::days(1));
    store.add(probe.clone())?;
    store.toggle_completion(&probe)?;
    store.sort_by(preferences.sort_order);
    println!("tasks count={}", store.len());

    for command in outbox.drain() {
        match command {
            NotificationCommand::Schedule(request) => println!(
                "notification schedule id={} title={:?} immediate={}",
                request.id, request.title, request.fire_immediately
            ),
            NotificationCommand::Cancel(id) => println!("notification cancel id={id}"),
        }
    }

    store.delete(&probe.id)?;
    Ok(())
}
