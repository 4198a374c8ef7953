//! Notification scheduler trait and request types.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const TASK_COMPLETED_TITLE: &str = "Task Completed";
pub const TASK_DUE_TITLE: &str = "Task Due";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Platform notification slot. Platform plugins take a signed 32-bit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(pub i32);

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives the notification slot for a task id.
///
/// 32-bit FNV-1a over the id bytes, masked to a non-negative `i32` so it is
/// stable across processes and platforms. Two distinct task ids can land on
/// the same slot, in which case the later schedule replaces the earlier one.
pub fn notification_id(task_id: &str) -> NotificationId {
    let hash = task_id.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    NotificationId((hash & 0x7fff_ffff) as i32)
}

/// One-shot alert request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
    /// Fire now instead of waiting for `fire_at`.
    pub fire_immediately: bool,
}

impl NotificationRequest {
    /// "Task Completed" alert fired at `now`.
    pub fn completed(task_id: &str, task_title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: notification_id(task_id),
            title: TASK_COMPLETED_TITLE.to_string(),
            body: format!("You completed \"{task_title}\"."),
            fire_at: now,
            fire_immediately: true,
        }
    }

    /// "Task Due" reminder scheduled at `due_at`.
    pub fn due(task_id: &str, task_title: &str, due_at: DateTime<Utc>) -> Self {
        Self {
            id: notification_id(task_id),
            title: TASK_DUE_TITLE.to_string(),
            body: format!("\"{task_title}\" is due."),
            fire_at: due_at,
            fire_immediately: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The scheduler backend cannot be reached.
    Unavailable(String),
    /// The backend refused the request.
    Rejected(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "notification scheduler unavailable: {message}"),
            Self::Rejected(message) => write!(f, "notification rejected: {message}"),
        }
    }
}

impl Error for NotifyError {}

/// External collaborator that arranges one-shot local alerts.
pub trait NotificationScheduler {
    /// Schedules `request` at its fire time, or fires it now when
    /// `fire_immediately` is set. Reusing an id replaces the previous alert.
    fn schedule_or_fire_now(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
    fn cancel(&self, id: NotificationId) -> Result<(), NotifyError>;
}

impl<T: NotificationScheduler + ?Sized> NotificationScheduler for Arc<T> {
    fn schedule_or_fire_now(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        (**self).schedule_or_fire_now(request)
    }

    fn cancel(&self, id: NotificationId) -> Result<(), NotifyError> {
        (**self).cancel(id)
    }
}
