//! Task Store: observable in-memory mirror of the persistent task table.
//!
//! # Responsibility
//! - Own the ordered in-memory task sequence shown by the UI.
//! - Apply mutations optimistically, publish, then persist.
//! - Drive due-date and completion notifications.
//!
//! # Invariants
//! - Operations take `&mut self`, so durable writes of one store never
//!   interleave or reorder.
//! - On a failed durable write the pre-mutation sequence is restored and
//!   republished before the error is returned.
//! - Notification side effects run only after the durable write succeeded,
//!   and their failures are logged, never returned.
//! - Sorting never touches durable storage.

use super::observer::{SubscriptionId, Subscribers};
use super::{StoreError, StoreResult};
use crate::model::preferences::SortOrder;
use crate::model::task::Task;
use crate::notify::scheduler::{
    notification_id, NotificationRequest, NotificationScheduler, NotifyError,
};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use std::cmp::Ordering;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

pub struct TaskStore<R, N> {
    repo: R,
    scheduler: N,
    tasks: Vec<Task>,
    subscribers: Subscribers<[Task]>,
    clock: Clock,
}

impl<R: TaskRepository, N: NotificationScheduler> TaskStore<R, N> {
    /// Creates an empty store. Call [`TaskStore::load`] to populate it.
    pub fn new(repo: R, scheduler: N) -> Self {
        Self {
            repo,
            scheduler,
            tasks: Vec::new(),
            subscribers: Subscribers::new(),
            clock: Box::new(Utc::now),
        }
    }

    /// Replaces the wall clock used to decide whether a due date is future.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current in-memory sequence.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registers a listener called with the full sequence after every change.
    pub fn subscribe(&mut self, listener: impl Fn(&[Task]) + Send + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Replaces memory with the full table in storage order.
    ///
    /// Memory is left untouched when the read fails.
    pub fn load(&mut self) -> StoreResult<()> {
        let loaded = self
            .repo
            .list_tasks()
            .map_err(|err| log_failure("task_load", None, err))?;
        debug!(
            "event=task_load module=store status=ok count={}",
            loaded.len()
        );
        self.replace_all(loaded);
        Ok(())
    }

    /// Replaces memory with tasks whose title contains `text` (case-sensitive).
    ///
    /// Empty text behaves like [`TaskStore::load`].
    pub fn search_by_title(&mut self, text: &str) -> StoreResult<()> {
        if text.is_empty() {
            return self.load();
        }

        let found = self
            .repo
            .search_by_title(text)
            .map_err(|err| log_failure("task_search", None, err))?;
        debug!(
            "event=task_search module=store status=ok count={}",
            found.len()
        );
        self.replace_all(found);
        Ok(())
    }

    /// Appends `task`, then inserts it.
    pub fn add(&mut self, task: Task) -> StoreResult<()> {
        task.validate()?;

        let snapshot = self.tasks.clone();
        self.tasks.push(task.clone());
        self.publish();

        let result = self.repo.insert_task(&task);
        self.reconcile("task_add", &task.id, snapshot, result)?;

        self.schedule_due_reminder(&task);
        Ok(())
    }

    /// Whole-record replace of the task with the same id.
    pub fn update(&mut self, task: Task) -> StoreResult<()> {
        self.replace_and_persist("task_update", &task)?;

        self.cancel_slot(&task.id);
        self.schedule_due_reminder(&task);
        Ok(())
    }

    /// Removes every in-memory task with `id`, then deletes it from storage.
    pub fn delete(&mut self, id: &str) -> StoreResult<()> {
        let snapshot = self.tasks.clone();
        self.tasks.retain(|task| task.id != id);
        self.publish();

        let result = ignore_not_found(self.repo.delete_task(id));
        self.reconcile("task_delete", id, snapshot, result)?;

        self.cancel_slot(id);
        Ok(())
    }

    /// Flips `is_completed` and persists it like [`TaskStore::update`].
    ///
    /// Completing cancels the task's reminder and fires "Task Completed" now.
    /// Reopening reschedules "Task Due" when the due date is still ahead.
    pub fn toggle_completion(&mut self, task: &Task) -> StoreResult<Task> {
        let updated = task.toggled();
        self.replace_and_persist("task_toggle", &updated)?;

        if updated.is_completed {
            self.cancel_slot(&updated.id);
            let now = (self.clock)();
            let request = NotificationRequest::completed(&updated.id, &updated.title, now);
            self.log_notify(
                "notify_completed",
                &updated.id,
                self.scheduler.schedule_or_fire_now(&request),
            );
        } else {
            self.schedule_due_reminder(&updated);
        }

        Ok(updated)
    }

    /// Reorders memory by a textual criterion; unknown criteria are a no-op.
    ///
    /// Returns whether the criterion was recognized.
    pub fn sort(&mut self, criterion: &str) -> bool {
        match SortOrder::parse(criterion) {
            Some(order) => {
                self.sort_by(order);
                true
            }
            None => {
                debug!("event=task_sort module=store status=ignored reason=unknown_criterion");
                false
            }
        }
    }

    /// Stable ascending sort of memory only.
    ///
    /// `Date` puts tasks without a due date last.
    pub fn sort_by(&mut self, order: SortOrder) {
        match order {
            SortOrder::Date => self.tasks.sort_by(compare_due_dates),
            SortOrder::Priority => self.tasks.sort_by_key(|task| task.priority),
        }
        self.publish();
    }

    fn replace_and_persist(&mut self, event: &'static str, task: &Task) -> StoreResult<()> {
        task.validate()?;

        let snapshot = self.tasks.clone();
        for slot in self.tasks.iter_mut().filter(|slot| slot.id == task.id) {
            *slot = task.clone();
        }
        self.publish();

        let result = ignore_not_found(self.repo.update_task(task));
        self.reconcile(event, &task.id, snapshot, result)
    }

    fn reconcile(
        &mut self,
        event: &'static str,
        task_id: &str,
        snapshot: Vec<Task>,
        result: RepoResult<()>,
    ) -> StoreResult<()> {
        match result {
            Ok(()) => {
                debug!("event={event} module=store status=ok task_id={task_id}");
                Ok(())
            }
            Err(err) => {
                self.tasks = snapshot;
                self.publish();
                Err(log_failure(event, Some(task_id), err))
            }
        }
    }

    fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.publish();
    }

    fn publish(&self) {
        self.subscribers.publish(&self.tasks);
    }

    fn schedule_due_reminder(&self, task: &Task) {
        if task.is_completed {
            return;
        }
        let now = (self.clock)();
        let Some(due_at) = task.due_date.filter(|due_at| *due_at > now) else {
            return;
        };
        let request = NotificationRequest::due(&task.id, &task.title, due_at);
        self.log_notify(
            "notify_due",
            &task.id,
            self.scheduler.schedule_or_fire_now(&request),
        );
    }

    fn cancel_slot(&self, task_id: &str) {
        let result = self.scheduler.cancel(notification_id(task_id));
        self.log_notify("notify_cancel", task_id, result);
    }

    fn log_notify(&self, event: &'static str, task_id: &str, result: Result<(), NotifyError>) {
        match result {
            Ok(()) => debug!(
                "event={event} module=store status=ok task_id={task_id} slot={}",
                notification_id(task_id)
            ),
            Err(err) => warn!(
                "event={event} module=store status=error task_id={task_id} error={err}"
            ),
        }
    }
}

impl<R, N> std::fmt::Debug for TaskStore<R, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks.len())
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

fn compare_due_dates(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ignore_not_found(result: RepoResult<()>) -> RepoResult<()> {
    match result {
        Err(RepoError::NotFound(_)) => Ok(()),
        other => other,
    }
}

fn log_failure(event: &'static str, task_id: Option<&str>, err: RepoError) -> StoreError {
    error!(
        "event={event} module=store status=error task_id={} error={err}",
        task_id.unwrap_or("-")
    );
    StoreError::from(err)
}
