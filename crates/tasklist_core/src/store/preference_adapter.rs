//! Preference Adapter: in-memory mirror of the single preferences record.
//!
//! # Invariants
//! - The record is read from storage at most once; later reads hit memory.
//! - A missing record materializes as the default and is persisted.
//! - `set` is a whole-record replace; a failed write restores the previous
//!   record, or the stored one when nothing was loaded yet, and republishes.

use super::observer::{SubscriptionId, Subscribers};
use super::{StoreError, StoreResult};
use crate::model::preferences::{SortOrder, UserPreferences};
use crate::repo::preference_repo::PreferenceRepository;
use log::{debug, error, info};

pub struct PreferenceAdapter<R> {
    repo: R,
    current: Option<UserPreferences>,
    subscribers: Subscribers<UserPreferences>,
}

impl<R: PreferenceRepository> PreferenceAdapter<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            current: None,
            subscribers: Subscribers::new(),
        }
    }

    /// Returns the record, reading or materializing it on first access.
    pub fn load(&mut self) -> StoreResult<UserPreferences> {
        if let Some(current) = self.current {
            return Ok(current);
        }

        let stored = self.repo.load_preferences().map_err(|err| {
            error!("event=prefs_load module=store status=error error={err}");
            StoreError::from(err)
        })?;

        let preferences = match stored {
            Some(preferences) => preferences,
            None => {
                let defaults = UserPreferences::default();
                self.repo.save_preferences(&defaults).map_err(|err| {
                    error!("event=prefs_default module=store status=error error={err}");
                    StoreError::from(err)
                })?;
                info!("event=prefs_default module=store status=ok");
                defaults
            }
        };

        self.current = Some(preferences);
        self.subscribers.publish(&preferences);
        Ok(preferences)
    }

    /// Same as [`PreferenceAdapter::load`].
    pub fn get(&mut self) -> StoreResult<UserPreferences> {
        self.load()
    }

    /// Replaces the whole record and persists it under the fixed key.
    pub fn set(&mut self, preferences: UserPreferences) -> StoreResult<()> {
        let previous = self.current.replace(preferences);
        self.subscribers.publish(&preferences);

        if let Err(err) = self.repo.save_preferences(&preferences) {
            error!("event=prefs_set module=store status=error error={err}");
            self.current = previous;
            match previous {
                Some(previous) => self.subscribers.publish(&previous),
                None => self.republish_stored(),
            }
            return Err(err.into());
        }

        debug!(
            "event=prefs_set module=store status=ok dark_mode={} sort_order={}",
            preferences.is_dark_mode, preferences.sort_order
        );
        Ok(())
    }

    /// Flips the theme flag and returns the new record.
    pub fn toggle_dark_mode(&mut self) -> StoreResult<UserPreferences> {
        let mut preferences = self.load()?;
        preferences.is_dark_mode = !preferences.is_dark_mode;
        self.set(preferences)?;
        Ok(preferences)
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> StoreResult<UserPreferences> {
        let mut preferences = self.load()?;
        preferences.sort_order = sort_order;
        self.set(preferences)?;
        Ok(preferences)
    }

    /// Re-reads storage after a failed first write so subscribers drop the
    /// rejected record; falls back to defaults when storage is unreadable.
    fn republish_stored(&mut self) {
        if self.load().is_err() {
            self.subscribers.publish(&UserPreferences::default());
        }
    }

    pub fn subscribe(
        &mut self,
        listener: impl Fn(&UserPreferences) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl<R> std::fmt::Debug for PreferenceAdapter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceAdapter")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
