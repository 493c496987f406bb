use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: config::Config,
    pub updates: UpdateTracker,
}

impl AppState {
    pub fn new(db: PgPool, env: config::Config) -> Self {
        Self {
            db,
            env,
            updates: UpdateTracker::new(),
        }
    }
}

/// Per-process record of the last snapshot served to each `(user, quiz)`
/// pair. Lost on restart and not shared across processes; a multi-process
/// deployment would need an external keyed store instead.
#[derive(Clone, Default)]
pub struct UpdateTracker {
    served: Arc<Mutex<HashMap<(i64, i64), OffsetDateTime>>>,
}

impl UpdateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a poll should get a fresh snapshot and stamp the
    /// watermark when it does. A quiz without a `last_updated` timestamp
    /// has never changed, so nothing is served unless forced.
    pub fn should_serve(
        &self,
        user_id: i64,
        quiz_id: i64,
        last_updated: Option<OffsetDateTime>,
        force: bool,
    ) -> bool {
        let mut served = self.served.lock().unwrap();
        let watermark = served
            .get(&(user_id, quiz_id))
            .copied()
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        let refresh = force || last_updated.is_some_and(|changed| watermark < changed);
        if refresh {
            served.insert((user_id, quiz_id), OffsetDateTime::now_utc());
        }
        refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn quiz_without_changes_is_never_served() {
        let tracker = UpdateTracker::new();
        assert!(!tracker.should_serve(1, 2, None, false));
        assert!(tracker.should_serve(1, 2, None, true));
    }

    #[test]
    fn first_change_is_served_once() {
        let tracker = UpdateTracker::new();
        let changed = OffsetDateTime::now_utc() - Duration::seconds(5);

        assert!(tracker.should_serve(1, 2, Some(changed), false));
        assert!(!tracker.should_serve(1, 2, Some(changed), false));
    }

    #[test]
    fn later_change_is_served_again() {
        let tracker = UpdateTracker::new();
        let changed = OffsetDateTime::now_utc() - Duration::seconds(5);
        assert!(tracker.should_serve(1, 2, Some(changed), false));

        let changed = OffsetDateTime::now_utc() + Duration::seconds(5);
        assert!(tracker.should_serve(1, 2, Some(changed), false));
    }

    #[test]
    fn watermarks_are_per_user_and_quiz() {
        let tracker = UpdateTracker::new();
        let changed = OffsetDateTime::now_utc() - Duration::seconds(5);

        assert!(tracker.should_serve(1, 2, Some(changed), false));
        assert!(tracker.should_serve(3, 2, Some(changed), false));
        assert!(tracker.should_serve(1, 4, Some(changed), false));
        assert!(!tracker.should_serve(1, 2, Some(changed), false));
    }
}
