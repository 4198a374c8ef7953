//! Core domain logic for Tasklist.
//! This crate is the single source of truth for task and preference state.

pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod store;

pub use db::{DbError, DbHandle};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::preferences::{SortOrder, UserPreferences};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use notify::outbox::{NotificationCommand, NotificationOutbox};
pub use notify::scheduler::{
    notification_id, NotificationId, NotificationRequest, NotificationScheduler, NotifyError,
};
pub use repo::preference_repo::{PreferenceRepository, SqlitePreferenceRepository};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use store::observer::SubscriptionId;
pub use store::preference_adapter::PreferenceAdapter;
pub use store::task_store::TaskStore;
pub use store::{StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
