//! Recording completed sessions into `UserProgress`.

use crate::achievements::check_achievements;
use crate::store::{LocalStore, PROGRESS_KEY};
use crate::streak::calculate_streak;
use crate::{Result, UserProgress};
use chrono::{DateTime, Utc};

impl UserProgress {
    /// Load progress from the store, defaulting when absent or unreadable
    pub fn load(store: &LocalStore) -> Result<Self> {
        store.get_or_default(PROGRESS_KEY)
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.put(PROGRESS_KEY, self)
    }

    /// Record a completed workout; returns newly unlocked achievement ids
    pub fn record_workout(&mut self, duration_secs: u32, now: DateTime<Utc>) -> Vec<&'static str> {
        self.total_workouts = self.total_workouts.saturating_add(1);
        self.total_workout_duration += u64::from(duration_secs);
        self.workout_streak = calculate_streak(self.workout_streak, self.last_workout_date, now);
        self.last_workout_date = Some(now);

        tracing::info!(
            "Recorded workout #{} (streak {})",
            self.total_workouts,
            self.workout_streak
        );
        self.unlock_new()
    }

    /// Record a completed focus session; returns newly unlocked achievement ids
    pub fn record_focus_session(
        &mut self,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) -> Vec<&'static str> {
        self.total_focus_sessions = self.total_focus_sessions.saturating_add(1);
        self.total_focus_duration += u64::from(duration_secs);
        self.focus_streak = calculate_streak(self.focus_streak, self.last_focus_session_date, now);
        self.last_focus_session_date = Some(now);

        tracing::info!(
            "Recorded focus session #{} (streak {})",
            self.total_focus_sessions,
            self.focus_streak
        );
        self.unlock_new()
    }

    fn unlock_new(&mut self) -> Vec<&'static str> {
        let unlocked = check_achievements(self, &self.achievements);
        for id in &unlocked {
            tracing::info!("Achievement unlocked: {}", id);
            self.achievements.insert((*id).to_string());
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_first_workout_unlocks_once() {
        let mut progress = UserProgress::default();
        assert_eq!(progress.record_workout(90, day(1)), vec!["first_workout"]);
        assert!(progress.record_workout(90, day(1)).is_empty());

        assert_eq!(progress.total_workouts, 2);
        assert_eq!(progress.total_workout_duration, 180);
        assert_eq!(progress.workout_streak, 1);
        assert_eq!(progress.last_workout_date, Some(day(1)));
    }

    #[test]
    fn test_streak_builds_over_days() {
        let mut progress = UserProgress::default();
        let mut unlocked = Vec::new();
        for d in 1..=3 {
            unlocked.extend(progress.record_focus_session(1500, day(d)));
        }
        assert_eq!(progress.focus_streak, 3);
        assert_eq!(unlocked, vec!["first_focus", "focus_streak_3"]);

        // Skip a day
        progress.record_focus_session(1500, day(5));
        assert_eq!(progress.focus_streak, 1);
        // Workout streak is independent
        assert_eq!(progress.workout_streak, 0);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        let mut progress = UserProgress::default();
        progress.record_workout(120, day(2) - Duration::hours(1));
        progress.save(&store).unwrap();

        let loaded = UserProgress::load(&store).unwrap();
        assert_eq!(loaded, progress);
        assert!(loaded.achievements.contains("first_workout"));
    }
}
