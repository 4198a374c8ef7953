//! In-process notification outbox.
//!
//! Records every scheduler command so a host (the Flutter side, a test) can
//! drain and forward them to the real platform plugin, and keeps a view of
//! which slots currently hold a future reminder.

use super::scheduler::{NotificationId, NotificationRequest, NotificationScheduler, NotifyError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Command recorded by [`NotificationOutbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationCommand {
    Schedule(NotificationRequest),
    Cancel(NotificationId),
}

#[derive(Debug, Default)]
struct OutboxState {
    commands: Vec<NotificationCommand>,
    scheduled: BTreeMap<NotificationId, NotificationRequest>,
}

#[derive(Debug, Default)]
pub struct NotificationOutbox {
    state: Mutex<OutboxState>,
}

impl NotificationOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all recorded commands in issue order.
    pub fn drain(&self) -> Vec<NotificationCommand> {
        self.lock()
            .map(|mut state| std::mem::take(&mut state.commands))
            .unwrap_or_default()
    }

    /// Returns recorded commands without consuming them.
    pub fn commands(&self) -> Vec<NotificationCommand> {
        self.lock()
            .map(|state| state.commands.clone())
            .unwrap_or_default()
    }

    /// Returns the outstanding future reminder for a slot, if any.
    pub fn scheduled(&self, id: NotificationId) -> Option<NotificationRequest> {
        self.lock()
            .ok()
            .and_then(|state| state.scheduled.get(&id).cloned())
    }

    pub fn scheduled_count(&self) -> usize {
        self.lock().map(|state| state.scheduled.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, OutboxState>, NotifyError> {
        self.state
            .lock()
            .map_err(|_| NotifyError::Unavailable("notification outbox is poisoned".to_string()))
    }
}

impl NotificationScheduler for NotificationOutbox {
    fn schedule_or_fire_now(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let mut state = self.lock()?;
        // Immediate alerts are fire-and-forget; they still replace the slot.
        if request.fire_immediately {
            state.scheduled.remove(&request.id);
        } else {
            state.scheduled.insert(request.id, request.clone());
        }
        state
            .commands
            .push(NotificationCommand::Schedule(request.clone()));
        Ok(())
    }

    fn cancel(&self, id: NotificationId) -> Result<(), NotifyError> {
        let mut state = self.lock()?;
        state.scheduled.remove(&id);
        state.commands.push(NotificationCommand::Cancel(id));
        Ok(())
    }
}
