//! Preference key-value repository.
//!
//! # Invariants
//! - The whole `UserPreferences` record lives under one fixed key.
//! - Values are stored as JSON text and always replaced as a whole.

use super::task_repo::{RepoError, RepoResult};
use crate::db::DbHandle;
use crate::model::preferences::UserPreferences;
use rusqlite::{params, OptionalExtension};

/// Fixed key of the single preferences record.
pub const PREFERENCES_KEY: &str = "user_preferences";

/// Repository interface for the persisted preferences record.
pub trait PreferenceRepository {
    fn load_preferences(&self) -> RepoResult<Option<UserPreferences>>;
    fn save_preferences(&self, preferences: &UserPreferences) -> RepoResult<()>;
}

/// SQLite-backed preference repository over the shared connection.
#[derive(Debug, Clone)]
pub struct SqlitePreferenceRepository {
    db: DbHandle,
}

impl SqlitePreferenceRepository {
    /// Constructs a repository from a migrated connection handle.
    pub fn try_new(db: DbHandle) -> RepoResult<Self> {
        db.with_conn(|conn| super::ensure_schema(conn, "preferences", &["key", "value"]))?;
        Ok(Self { db })
    }
}

impl PreferenceRepository for SqlitePreferenceRepository {
    fn load_preferences(&self) -> RepoResult<Option<UserPreferences>> {
        let raw: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [PREFERENCES_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(RepoError::from)
        })?;

        raw.map(|value| {
            serde_json::from_str(&value).map_err(|err| {
                RepoError::InvalidData(format!(
                    "invalid preferences value under `{PREFERENCES_KEY}`: {err}"
                ))
            })
        })
        .transpose()
    }

    fn save_preferences(&self, preferences: &UserPreferences) -> RepoResult<()> {
        let value = serde_json::to_string(preferences).map_err(|err| {
            RepoError::InvalidData(format!("preferences cannot be encoded: {err}"))
        })?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
                params![PREFERENCES_KEY, value],
            )
            .map(|_| ())
            .map_err(RepoError::from)
        })
    }
}
