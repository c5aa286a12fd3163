//! Built-in exercise catalog.
//!
//! Exercises are defined at build time; the config file may append custom
//! entries on top of the defaults.

use crate::selector::Slot;
use crate::types::*;
use crate::Config;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Vec<Exercise>> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static [Exercise] {
    &DEFAULT_CATALOG
}

/// Default catalog plus any custom exercises from the config
///
/// A custom exercise whose name collides with a built-in one replaces it.
pub fn catalog_with_custom(config: &Config) -> Vec<Exercise> {
    let mut catalog: Vec<Exercise> = default_catalog().to_vec();
    for custom in &config.exercises.custom {
        if let Some(existing) = catalog.iter_mut().find(|e| e.name == custom.name) {
            tracing::debug!("Custom exercise '{}' overrides built-in", custom.name);
            *existing = custom.clone();
        } else {
            catalog.push(custom.clone());
        }
    }
    catalog
}

fn exercise(
    name: &str,
    category: ExerciseCategory,
    duration: u32,
    difficulty: &[Difficulty],
    equipment: Option<&[&str]>,
    instructions: &[&str],
) -> Exercise {
    Exercise {
        name: name.into(),
        category,
        duration,
        difficulty: difficulty.to_vec(),
        equipment: equipment.map(|items| items.iter().map(|s| s.to_string()).collect()),
        instructions: instructions.iter().map(|s| s.to_string()).collect(),
    }
}

/// Builds the default catalog
///
/// **Note**: prefer `default_catalog()` which returns a cached reference.
pub fn build_default_catalog() -> Vec<Exercise> {
    use Difficulty::*;
    use ExerciseCategory::*;

    vec![
        // ====================================================================
        // Upper body
        // ====================================================================
        exercise(
            "Push-ups",
            Upper,
            30,
            &[Medium, Hard],
            None,
            &[
                "Start in a high plank with hands under shoulders",
                "Lower your chest until it nearly touches the floor",
                "Press back up, keeping your body in a straight line",
            ],
        ),
        exercise(
            "Incline Push-ups",
            Upper,
            30,
            &[Easy, Medium],
            Some(&["chair"]),
            &[
                "Place your hands on the edge of a sturdy chair",
                "Walk your feet back into a plank",
                "Lower your chest to the chair and press back up",
            ],
        ),
        exercise(
            "Wall Push-ups",
            Upper,
            30,
            &[Easy],
            None,
            &[
                "Stand an arm's length from a wall",
                "Place your palms flat on the wall at shoulder height",
                "Bend your elbows to bring your chest toward the wall, then push away",
            ],
        ),
        exercise(
            "Chair Dips",
            Upper,
            30,
            &[Medium, Hard],
            Some(&["chair"]),
            &[
                "Sit on the edge of a chair with hands beside your hips",
                "Slide forward off the seat",
                "Bend your elbows to lower, then straighten to rise",
            ],
        ),
        exercise(
            "Pike Push-ups",
            Upper,
            30,
            &[Hard],
            None,
            &[
                "Start in a downward-dog position with hips high",
                "Bend your elbows to bring your head toward the floor",
                "Press back up to the start",
            ],
        ),
        exercise(
            "Band Pull-aparts",
            Upper,
            30,
            &[Easy, Medium],
            Some(&["resistance_band"]),
            &[
                "Hold a band in front of you at shoulder height",
                "Pull the band apart by squeezing your shoulder blades",
                "Return slowly to the start",
            ],
        ),
        // ====================================================================
        // Lower body
        // ====================================================================
        exercise(
            "Bodyweight Squats",
            Lower,
            30,
            &[Easy, Medium],
            None,
            &[
                "Stand with feet shoulder-width apart",
                "Push your hips back and bend your knees",
                "Drive through your heels to stand",
            ],
        ),
        exercise(
            "Reverse Lunges",
            Lower,
            30,
            &[Medium],
            None,
            &[
                "Step one foot back and lower your back knee toward the floor",
                "Push through the front heel to return",
                "Alternate legs",
            ],
        ),
        exercise(
            "Jump Squats",
            Lower,
            30,
            &[Hard],
            None,
            &[
                "Lower into a squat",
                "Explode upward into a jump",
                "Land softly and go straight into the next rep",
            ],
        ),
        exercise(
            "Glute Bridges",
            Lower,
            30,
            &[Easy, Medium],
            None,
            &[
                "Lie on your back with knees bent and feet flat",
                "Lift your hips until your body forms a straight line",
                "Lower with control",
            ],
        ),
        exercise(
            "Step-ups",
            Lower,
            30,
            &[Medium, Hard],
            Some(&["chair"]),
            &[
                "Place one foot on a sturdy chair",
                "Drive through that heel to step up",
                "Step down and alternate legs",
            ],
        ),
        // ====================================================================
        // Full body
        // ====================================================================
        exercise(
            "Burpees",
            FullBody,
            30,
            &[Hard],
            None,
            &[
                "Squat down and place your hands on the floor",
                "Jump your feet back into a plank",
                "Jump your feet forward and leap up",
            ],
        ),
        exercise(
            "Mountain Climbers",
            FullBody,
            30,
            &[Medium, Hard],
            None,
            &[
                "Start in a high plank",
                "Drive one knee toward your chest",
                "Switch legs quickly, like running in place",
            ],
        ),
        // ====================================================================
        // Mobility and stretching
        // ====================================================================
        exercise(
            "Cat-Cow",
            Mobility,
            45,
            &[Easy, Medium, Hard],
            None,
            &[
                "Start on hands and knees",
                "Arch your back and lift your head (cow)",
                "Round your spine and tuck your chin (cat)",
            ],
        ),
        exercise(
            "Hip Circles",
            Mobility,
            30,
            &[Easy, Medium],
            None,
            &[
                "Stand with hands on hips",
                "Draw large circles with your hips",
                "Switch direction halfway through",
            ],
        ),
        exercise(
            "World's Greatest Stretch",
            Mobility,
            45,
            &[Medium, Hard],
            None,
            &[
                "Step into a deep lunge",
                "Place the opposite hand on the floor and rotate the other arm to the ceiling",
                "Return and switch sides",
            ],
        ),
        exercise(
            "Neck and Shoulder Rolls",
            Stretch,
            30,
            &[Easy, Medium, Hard],
            None,
            &[
                "Sit or stand tall",
                "Roll your shoulders backward slowly",
                "Tilt your head gently side to side",
            ],
        ),
        exercise(
            "Standing Forward Fold",
            Stretch,
            30,
            &[Easy, Medium],
            None,
            &[
                "Stand with feet hip-width apart",
                "Hinge at the hips and let your upper body hang",
                "Breathe slowly and relax your neck",
            ],
        ),
    ]
}

/// Validate a catalog for consistency and completeness
///
/// Returns a list of validation errors, or empty Vec if valid.
pub fn validate(catalog: &[Exercise]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for exercise in catalog {
        if exercise.name.trim().is_empty() {
            errors.push("Exercise has empty name".to_string());
            continue;
        }
        if !seen.insert(exercise.name.as_str()) {
            errors.push(format!("Duplicate exercise name '{}'", exercise.name));
        }
        if exercise.duration == 0 {
            errors.push(format!("Exercise '{}' has zero duration", exercise.name));
        }
        if exercise.difficulty.is_empty() {
            errors.push(format!("Exercise '{}' has no difficulty tags", exercise.name));
        }
        if exercise.instructions.is_empty() {
            errors.push(format!("Exercise '{}' has no instructions", exercise.name));
        }
    }

    for slot in Slot::ALL {
        if !catalog.iter().any(|e| slot.accepts(e.category)) {
            errors.push(format!("Catalog has no exercises for the {} slot", slot));
        }
    }

    errors
}
