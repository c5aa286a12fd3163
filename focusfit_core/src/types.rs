//! Core domain types for FocusFit.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and their tags
//! - User settings that drive exercise selection
//! - Cumulative user progress
//! - Completed session records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// Body area an exercise targets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseCategory {
    Upper,
    Lower,
    Mobility,
    FullBody,
    Stretch,
}

/// Difficulty tag
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown difficulty '{}' (expected easy, medium or hard)",
                other
            ))),
        }
    }
}

/// A single exercise in the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub category: ExerciseCategory,
    /// Active duration in seconds
    pub duration: u32,
    pub difficulty: Vec<Difficulty>,
    /// Required equipment; `None` means bodyweight only
    #[serde(default)]
    pub equipment: Option<Vec<String>>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Exercise {
    /// True when the exercise needs nothing but the floor
    pub fn is_bodyweight(&self) -> bool {
        self.equipment.as_ref().map_or(true, |e| e.is_empty())
    }
}

// ============================================================================
// Settings and Progress
// ============================================================================

/// Per-user preferences that drive exercise selection
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserSettings {
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub excluded_exercises: BTreeSet<String>,
}

/// Cumulative counters updated after every completed session
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UserProgress {
    pub total_workouts: u32,
    pub total_focus_sessions: u32,
    pub workout_streak: u32,
    pub focus_streak: u32,
    /// Seconds
    pub total_workout_duration: u64,
    /// Seconds
    pub total_focus_duration: u64,
    pub last_workout_date: Option<DateTime<Utc>>,
    pub last_focus_session_date: Option<DateTime<Utc>>,
    pub achievements: BTreeSet<String>,
}

// ============================================================================
// Session History
// ============================================================================

/// Which kind of activity a session record describes
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Workout,
    Focus,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Workout => f.write_str("workout"),
            SessionKind::Focus => f.write_str("focus"),
        }
    }
}

/// A completed session, appended to the history log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_secs: u32,
    /// Exercise names, empty for focus sessions
    #[serde(default)]
    pub exercises: Vec<String>,
}

impl SessionRecord {
    pub fn new(
        kind: SessionKind,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_secs: u32,
        exercises: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            started_at,
            completed_at,
            duration_secs,
            exercises,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_category_serializes_camel_case() {
        let json = serde_json::to_string(&ExerciseCategory::FullBody).unwrap();
        assert_eq!(json, "\"fullBody\"");
    }

    #[test]
    fn test_progress_tolerates_missing_fields() {
        let progress: UserProgress = serde_json::from_str(r#"{"total_workouts": 4}"#).unwrap();
        assert_eq!(progress.total_workouts, 4);
        assert!(progress.achievements.is_empty());
        assert!(progress.last_workout_date.is_none());
    }

    #[test]
    fn test_bodyweight_detection() {
        let mut exercise = Exercise {
            name: "Squat".into(),
            category: ExerciseCategory::Lower,
            duration: 30,
            difficulty: vec![Difficulty::Easy],
            equipment: None,
            instructions: vec![],
        };
        assert!(exercise.is_bodyweight());

        exercise.equipment = Some(vec![]);
        assert!(exercise.is_bodyweight());

        exercise.equipment = Some(vec!["chair".into()]);
        assert!(!exercise.is_bodyweight());
    }
}
