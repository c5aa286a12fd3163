//! Achievement table and evaluation.
//!
//! Every condition only looks at counters that never decrease (totals) or at
//! streak values, so once an achievement is unlocked it stays unlocked.

use crate::UserProgress;
use std::collections::BTreeSet;

pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub condition: fn(&UserProgress) -> bool,
}

const HOUR: u64 = 3600;

/// All achievements, in display order
pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_workout",
        title: "First Steps",
        description: "Complete your first workout",
        condition: |p| p.total_workouts >= 1,
    },
    Achievement {
        id: "first_focus",
        title: "In the Zone",
        description: "Complete your first focus session",
        condition: |p| p.total_focus_sessions >= 1,
    },
    Achievement {
        id: "workouts_10",
        title: "Getting Stronger",
        description: "Complete 10 workouts",
        condition: |p| p.total_workouts >= 10,
    },
    Achievement {
        id: "focus_25",
        title: "Deep Worker",
        description: "Complete 25 focus sessions",
        condition: |p| p.total_focus_sessions >= 25,
    },
    Achievement {
        id: "workout_streak_3",
        title: "Three in a Row",
        description: "Work out three days in a row",
        condition: |p| p.workout_streak >= 3,
    },
    Achievement {
        id: "focus_streak_3",
        title: "Focused Habit",
        description: "Focus three days in a row",
        condition: |p| p.focus_streak >= 3,
    },
    Achievement {
        id: "workout_streak_7",
        title: "Week Warrior",
        description: "Work out seven days in a row",
        condition: |p| p.workout_streak >= 7,
    },
    Achievement {
        id: "focus_streak_7",
        title: "Unbreakable Focus",
        description: "Focus seven days in a row",
        condition: |p| p.focus_streak >= 7,
    },
    Achievement {
        id: "workouts_50",
        title: "Fitness Regular",
        description: "Complete 50 workouts",
        condition: |p| p.total_workouts >= 50,
    },
    Achievement {
        id: "focus_100",
        title: "Centurion",
        description: "Complete 100 focus sessions",
        condition: |p| p.total_focus_sessions >= 100,
    },
    Achievement {
        id: "focus_hours_10",
        title: "Ten Hours Deep",
        description: "Spend 10 hours in focus sessions",
        condition: |p| p.total_focus_duration >= 10 * HOUR,
    },
    Achievement {
        id: "workout_hour",
        title: "Hour of Power",
        description: "Spend an hour working out in total",
        condition: |p| p.total_workout_duration >= HOUR,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Ids whose condition holds and that are not already unlocked
///
/// Output follows table order.
pub fn check_achievements(
    progress: &UserProgress,
    already_unlocked: &BTreeSet<String>,
) -> Vec<&'static str> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !already_unlocked.contains(a.id))
        .filter(|a| (a.condition)(progress))
        .map(|a| a.id)
        .collect()
}
