//! Domain model for tasks and user preferences.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` assigned at creation.
//! - Deletion is a hard delete; there are no tombstones.
//! - Preferences are a single whole-record value per installation.

pub mod preferences;
pub mod task;
