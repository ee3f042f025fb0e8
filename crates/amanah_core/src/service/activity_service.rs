//! Activity feed use-cases.
//!
//! # Invariants
//! - The stored feed never exceeds `ACTIVITY_LOG_CAPACITY` entries.
//! - Other services append through `append_activity` inside their own
//!   transaction, so the feed entry commits with the change it describes.

use crate::model::activity::{push_capped, Activity, NewActivity};
use crate::model::now_epoch_ms;
use crate::repo::{RepoResult, SeedMode, ACTIVITIES};
use crate::store::{KvAccess, KvStore};
use log::debug;

/// Activity feed facade.
pub struct ActivityService<S: KvStore> {
    store: S,
    seed: SeedMode,
}

impl<S: KvStore> ActivityService<S> {
    pub fn new(store: S) -> Self {
        Self::with_seed_mode(store, SeedMode::default())
    }

    pub fn with_seed_mode(store: S, seed: SeedMode) -> Self {
        Self { store, seed }
    }

    /// Lists the feed newest-first, optionally truncated to `limit`.
    pub fn list_activities(&self, limit: Option<usize>) -> RepoResult<Vec<Activity>> {
        let mut activities = self
            .store
            .transaction(|access| ACTIVITIES.load(access, self.seed, now_epoch_ms()))?;
        if let Some(limit) = limit {
            activities.truncate(limit);
        }
        Ok(activities)
    }

    /// Appends one entry and returns it.
    pub fn record_activity(&self, activity: NewActivity) -> RepoResult<Activity> {
        self.store
            .transaction(|access| append_activity(access, self.seed, activity, now_epoch_ms()))
    }
}

/// Appends one feed entry using an open store scope.
pub(crate) fn append_activity(
    access: &dyn KvAccess,
    seed: SeedMode,
    activity: NewActivity,
    now_ms: i64,
) -> RepoResult<Activity> {
    let mut feed = ACTIVITIES.load(access, seed, now_ms)?;
    let entry = activity.into_activity(now_ms);
    let evicted = push_capped(&mut feed, entry.clone());
    ACTIVITIES.save(access, &feed)?;
    debug!(
        "event=activity_append module=service status=ok kind={:?} evicted={evicted}",
        entry.kind
    );
    Ok(entry)
}
