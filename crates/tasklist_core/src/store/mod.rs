//! In-memory stores mirroring persistent state.
//!
//! # Responsibility
//! - Hold the authoritative in-memory task sequence and preference record.
//! - Keep memory write-through consistent with durable storage.
//! - Broadcast every in-memory change to registered subscribers.
//!
//! # Invariants
//! - Memory changes first and is published before the durable write.
//! - A failed durable write restores and republishes the previous state.
//! - Not-found on update/delete is not an error.

use crate::model::task::TaskValidationError;
use crate::repo::task_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod observer;
pub mod preference_adapter;
pub mod task_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error returned to the presentation layer.
#[derive(Debug)]
pub enum StoreError {
    /// Rejected before memory or storage was touched.
    Validation(TaskValidationError),
    /// Durable storage failed; memory has been restored.
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}
