//! Schema ladder for the task database.
//!
//! | version | step          | adds                                  |
//! |---------|---------------|---------------------------------------|
//! | 1       | `tasks`       | task table, one row per task          |
//! | 2       | `preferences` | key/value table for the prefs record  |
//!
//! Steps newer than the database's `PRAGMA user_version` run in ascending
//! order inside a single transaction, and each bumps `user_version` as it
//! lands. Steps are append-only: never edit a released one.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const LADDER: &[Step] = &[
    Step {
        version: 1,
        name: "tasks",
        sql: include_str!("0001_tasks.sql"),
    },
    Step {
        version: 2,
        name: "preferences",
        sql: include_str!("0002_preferences.sql"),
    },
];

/// Highest schema version this build can open.
pub fn latest_version() -> u32 {
    LADDER.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// Fails with [`DbError::UnsupportedSchemaVersion`] when the file was written
/// by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = user_version(conn)?;
    let latest = latest_version();

    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }
    if from == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in LADDER.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} step={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={latest}");
    Ok(())
}

fn user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
