//! Exercise selection.
//!
//! Picks a short workout (one exercise per slot) from the catalog, honouring
//! the user's difficulty, owned equipment and exclusion list. Sampling is
//! uniform among eligible candidates and without replacement across slots.

use crate::{Exercise, ExerciseCategory, UserSettings};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// A position in the generated workout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Upper,
    Lower,
    Mobility,
}

impl Slot {
    /// Slots in workout order
    pub const ALL: [Slot; 3] = [Slot::Upper, Slot::Lower, Slot::Mobility];

    /// Whether an exercise of this category can fill the slot
    pub fn accepts(self, category: ExerciseCategory) -> bool {
        match self {
            Slot::Upper => matches!(category, ExerciseCategory::Upper | ExerciseCategory::FullBody),
            Slot::Lower => matches!(category, ExerciseCategory::Lower | ExerciseCategory::FullBody),
            Slot::Mobility => {
                matches!(category, ExerciseCategory::Mobility | ExerciseCategory::Stretch)
            }
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Upper => f.write_str("upper"),
            Slot::Lower => f.write_str("lower"),
            Slot::Mobility => f.write_str("mobility"),
        }
    }
}

/// True if the exercise matches difficulty, equipment and exclusions
pub fn is_eligible(exercise: &Exercise, settings: &UserSettings) -> bool {
    if !exercise.difficulty.contains(&settings.difficulty) {
        return false;
    }
    if settings.excluded_exercises.contains(&exercise.name) {
        return false;
    }
    match exercise.equipment {
        Some(ref needed) => needed.iter().all(|item| settings.equipment.contains(item)),
        None => true,
    }
}

/// Select a workout of up to three exercises
///
/// Each pick is paired with the slot it fills. A slot with no eligible
/// candidates is left out, so the result may be shorter than three or empty.
/// Callers treat empty as "no workout available".
pub fn select_workout<R: Rng + ?Sized>(
    catalog: &[Exercise],
    settings: &UserSettings,
    rng: &mut R,
) -> Vec<(Slot, Exercise)> {
    let mut picked: Vec<(Slot, Exercise)> = Vec::with_capacity(Slot::ALL.len());

    for slot in Slot::ALL {
        let candidates: Vec<&Exercise> = catalog
            .iter()
            .filter(|e| slot.accepts(e.category))
            .filter(|e| is_eligible(e, settings))
            .filter(|e| !picked.iter().any(|(_, p)| p.name == e.name))
            .collect();

        match candidates.choose(rng) {
            Some(choice) => {
                tracing::debug!("Selected '{}' for {} slot", choice.name, slot);
                picked.push((slot, (*choice).clone()));
            }
            None => {
                tracing::info!("No eligible exercise for {} slot, omitting", slot);
            }
        }
    }

    picked
}

/// Find a different eligible exercise to fill `slot` in place of `current`
///
/// The slot comes from the selection, not from `current`'s category, since a
/// full-body exercise can sit in either strength slot. `taken` lists names
/// already in the workout; they are never returned.
pub fn find_alternative<R: Rng + ?Sized>(
    catalog: &[Exercise],
    settings: &UserSettings,
    slot: Slot,
    current: &Exercise,
    taken: &[String],
    rng: &mut R,
) -> Option<Exercise> {
    let candidates: Vec<&Exercise> = catalog
        .iter()
        .filter(|e| slot.accepts(e.category))
        .filter(|e| e.name != current.name)
        .filter(|e| !taken.contains(&e.name))
        .filter(|e| is_eligible(e, settings))
        .collect();

    candidates.choose(rng).map(|e| (*e).clone())
}
