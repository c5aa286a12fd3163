//! Workout session state machine.
//!
//! Each exercise goes Preview -> Countdown -> Active. When the active phase
//! of the last exercise reaches zero the session is Completed, which is
//! terminal; otherwise it moves on to the next exercise's Preview. Leaving
//! Preview is user-triggered (`start_exercise`), everything else is driven
//! by `tick`, which the caller invokes once per second.

use crate::config::WorkoutConfig;
use crate::{Error, Exercise, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Preview,
    Countdown,
    Active,
    Completed,
}

/// Audio cues emitted by the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Countdown second elapsed, more to go
    CountdownTick,
    /// Countdown hit zero; exercise begins
    CountdownGo,
    /// Active phase hit zero
    ExerciseEnd,
}

pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

impl<S: CueSink + ?Sized> CueSink for &mut S {
    fn play(&mut self, cue: Cue) {
        (**self).play(cue)
    }
}

/// Plays nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentCues;

impl CueSink for SilentCues {
    fn play(&mut self, _cue: Cue) {}
}

/// What a tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutEvent {
    /// Nothing to do in this phase
    Waiting,
    Countdown { seconds_left: u32 },
    ExerciseStarted { index: usize },
    Active { seconds_left: u32 },
    NextExercise { index: usize },
    WorkoutCompleted,
    /// The completion callback ran after the post-workout delay
    CompletionNotified,
}

pub struct WorkoutSession<S: CueSink> {
    exercises: Vec<Exercise>,
    current_index: usize,
    phase: Phase,
    seconds_left: u32,
    countdown_seconds: u32,
    completion_delay: u32,
    completion_ticks_left: Option<u32>,
    active_seconds: u32,
    cues: S,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl<S: CueSink> WorkoutSession<S> {
    /// Create a session at the first exercise's Preview
    ///
    /// An empty exercise list means there is no workout to run.
    pub fn new(exercises: Vec<Exercise>, cues: S) -> Result<Self> {
        let first = exercises.first().ok_or(Error::NoWorkoutAvailable)?;
        let seconds_left = first.duration;
        let defaults = WorkoutConfig::default();
        Ok(Self {
            exercises,
            current_index: 0,
            phase: Phase::Preview,
            seconds_left,
            countdown_seconds: defaults.countdown_seconds,
            completion_delay: defaults.completion_delay_seconds,
            completion_ticks_left: None,
            active_seconds: 0,
            cues,
            on_complete: None,
        })
    }

    /// Apply countdown length and completion delay from config
    pub fn with_timing(mut self, config: &WorkoutConfig) -> Self {
        self.countdown_seconds = config.countdown_seconds;
        self.completion_delay = config.completion_delay_seconds;
        self
    }

    pub fn on_complete(&mut self, f: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.exercises[self.current_index]
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// Sum of active durations
    pub fn total_duration(&self) -> u32 {
        self.exercises.iter().map(|e| e.duration).sum()
    }

    /// Seconds spent in Active so far, across all exercises
    pub fn active_seconds(&self) -> u32 {
        self.active_seconds
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    pub fn cues(&self) -> &S {
        &self.cues
    }

    /// Leave Preview and begin the countdown for the current exercise
    pub fn start_exercise(&mut self) -> Result<()> {
        if self.phase != Phase::Preview {
            return Err(Error::InvalidTransition(format!(
                "cannot start exercise from {:?}",
                self.phase
            )));
        }
        if self.countdown_seconds == 0 {
            self.cues.play(Cue::CountdownGo);
            self.begin_active();
        } else {
            self.phase = Phase::Countdown;
            self.seconds_left = self.countdown_seconds;
        }
        tracing::debug!(
            "Starting '{}' ({} of {})",
            self.current_exercise().name,
            self.current_index + 1,
            self.exercises.len()
        );
        Ok(())
    }

    /// Advance one second
    pub fn tick(&mut self) -> WorkoutEvent {
        match self.phase {
            Phase::Preview => WorkoutEvent::Waiting,
            Phase::Countdown => {
                self.seconds_left = self.seconds_left.saturating_sub(1);
                if self.seconds_left > 0 {
                    self.cues.play(Cue::CountdownTick);
                    WorkoutEvent::Countdown {
                        seconds_left: self.seconds_left,
                    }
                } else {
                    self.cues.play(Cue::CountdownGo);
                    self.begin_active();
                    WorkoutEvent::ExerciseStarted {
                        index: self.current_index,
                    }
                }
            }
            Phase::Active => {
                self.active_seconds += 1;
                self.seconds_left = self.seconds_left.saturating_sub(1);
                if self.seconds_left > 0 {
                    return WorkoutEvent::Active {
                        seconds_left: self.seconds_left,
                    };
                }
                self.cues.play(Cue::ExerciseEnd);
                if self.current_index + 1 < self.exercises.len() {
                    self.move_to(self.current_index + 1);
                    WorkoutEvent::NextExercise {
                        index: self.current_index,
                    }
                } else {
                    self.finish();
                    if self.completion_ticks_left.is_none() {
                        WorkoutEvent::CompletionNotified
                    } else {
                        WorkoutEvent::WorkoutCompleted
                    }
                }
            }
            Phase::Completed => match self.completion_ticks_left {
                Some(left) if left <= 1 => {
                    self.completion_ticks_left = None;
                    self.notify_complete();
                    WorkoutEvent::CompletionNotified
                }
                Some(left) => {
                    self.completion_ticks_left = Some(left - 1);
                    WorkoutEvent::Waiting
                }
                None => WorkoutEvent::Waiting,
            },
        }
    }

    /// Jump to the next exercise's Preview, or complete on the last one
    pub fn skip(&mut self) -> Result<()> {
        self.ensure_not_completed("skip")?;
        if self.current_index + 1 < self.exercises.len() {
            self.move_to(self.current_index + 1);
        } else {
            self.finish();
        }
        Ok(())
    }

    /// Return the current exercise to Preview with its full duration
    pub fn restart(&mut self) -> Result<()> {
        self.ensure_not_completed("restart")?;
        self.move_to(self.current_index);
        Ok(())
    }

    /// Replace the current exercise and return to Preview
    pub fn shuffle(&mut self, replacement: Exercise) -> Result<()> {
        self.ensure_not_completed("shuffle")?;
        tracing::debug!(
            "Replacing '{}' with '{}'",
            self.current_exercise().name,
            replacement.name
        );
        self.exercises[self.current_index] = replacement;
        self.move_to(self.current_index);
        Ok(())
    }

    fn ensure_not_completed(&self, action: &str) -> Result<()> {
        if self.phase == Phase::Completed {
            Err(Error::InvalidTransition(format!(
                "cannot {} a completed workout",
                action
            )))
        } else {
            Ok(())
        }
    }

    fn begin_active(&mut self) {
        self.phase = Phase::Active;
        self.seconds_left = self.current_exercise().duration;
    }

    fn move_to(&mut self, index: usize) {
        self.current_index = index;
        self.phase = Phase::Preview;
        self.seconds_left = self.exercises[index].duration;
    }

    fn finish(&mut self) {
        self.phase = Phase::Completed;
        self.seconds_left = 0;
        tracing::info!("Workout completed ({} exercises)", self.exercises.len());
        if self.completion_delay == 0 {
            self.completion_ticks_left = None;
            self.notify_complete();
        } else {
            self.completion_ticks_left = Some(self.completion_delay);
        }
    }

    fn notify_complete(&mut self) {
        if let Some(ref mut callback) = self.on_complete {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Difficulty, ExerciseCategory};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingCues(Vec<Cue>);

    impl CueSink for RecordingCues {
        fn play(&mut self, cue: Cue) {
            self.0.push(cue);
        }
    }

    fn exercise(name: &str, duration: u32) -> Exercise {
        Exercise {
            name: name.into(),
            category: ExerciseCategory::Upper,
            duration,
            difficulty: vec![Difficulty::Easy],
            equipment: None,
            instructions: vec!["Move".into()],
        }
    }

    /// Tick until the phase changes, returning the new phase
    fn run_phase<S: CueSink>(session: &mut WorkoutSession<S>) -> Phase {
        let start = session.phase();
        for _ in 0..1000 {
            session.tick();
            if session.phase() != start {
                return session.phase();
            }
        }
        panic!("phase {:?} never ended", start);
    }

    #[test]
    fn test_empty_list_is_no_workout() {
        assert!(matches!(
            WorkoutSession::new(vec![], SilentCues),
            Err(Error::NoWorkoutAvailable)
        ));
    }

    #[test]
    fn test_last_exercise_goes_straight_to_completed() {
        let mut session =
            WorkoutSession::new(vec![exercise("A", 2), exercise("B", 2)], SilentCues).unwrap();

        session.start_exercise().unwrap();
        assert_eq!(run_phase(&mut session), Phase::Active);
        assert_eq!(run_phase(&mut session), Phase::Preview);
        assert_eq!(session.current_index(), 1);

        session.start_exercise().unwrap();
        assert_eq!(run_phase(&mut session), Phase::Active);
        assert_eq!(run_phase(&mut session), Phase::Completed);
        assert_eq!(session.current_index(), 1);

        // Terminal
        for _ in 0..10 {
            session.tick();
            assert_eq!(session.phase(), Phase::Completed);
        }
    }

    #[test]
    fn test_countdown_and_end_cues() {
        let mut session =
            WorkoutSession::new(vec![exercise("A", 2)], RecordingCues::default()).unwrap();
        session.start_exercise().unwrap();
        assert_eq!(session.seconds_left(), 3);

        assert_eq!(session.tick(), WorkoutEvent::Countdown { seconds_left: 2 });
        assert_eq!(session.tick(), WorkoutEvent::Countdown { seconds_left: 1 });
        assert_eq!(session.tick(), WorkoutEvent::ExerciseStarted { index: 0 });
        assert_eq!(session.seconds_left(), 2);
        assert_eq!(session.tick(), WorkoutEvent::Active { seconds_left: 1 });
        assert_eq!(session.tick(), WorkoutEvent::WorkoutCompleted);

        assert_eq!(
            session.cues().0,
            vec![
                Cue::CountdownTick,
                Cue::CountdownTick,
                Cue::CountdownGo,
                Cue::ExerciseEnd
            ]
        );
    }

    #[test]
    fn test_completion_callback_after_delay_once() {
        let fired = Rc::new(Cell::new(0));
        let mut session = WorkoutSession::new(vec![exercise("A", 1)], SilentCues).unwrap();
        let counter = fired.clone();
        session.on_complete(move || counter.set(counter.get() + 1));

        session.start_exercise().unwrap();
        for _ in 0..3 {
            session.tick();
        }
        assert_eq!(session.tick(), WorkoutEvent::WorkoutCompleted);
        assert_eq!(fired.get(), 0);

        assert_eq!(session.tick(), WorkoutEvent::CompletionNotified);
        assert_eq!(fired.get(), 1);

        session.tick();
        session.tick();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_custom_timing() {
        let config = WorkoutConfig {
            countdown_seconds: 0,
            completion_delay_seconds: 0,
        };
        let fired = Rc::new(Cell::new(false));
        let mut session = WorkoutSession::new(vec![exercise("A", 1)], SilentCues)
            .unwrap()
            .with_timing(&config);
        let flag = fired.clone();
        session.on_complete(move || flag.set(true));

        session.start_exercise().unwrap();
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.tick(), WorkoutEvent::CompletionNotified);
        assert!(fired.get());
    }

    #[test]
    fn test_zero_countdown_still_plays_go() {
        let config = WorkoutConfig {
            countdown_seconds: 0,
            completion_delay_seconds: 1,
        };
        let mut session = WorkoutSession::new(
            vec![exercise("A", 2), exercise("B", 2)],
            RecordingCues::default(),
        )
        .unwrap()
        .with_timing(&config);

        session.start_exercise().unwrap();
        assert_eq!(session.cues().0, vec![Cue::CountdownGo]);

        session.tick();
        session.tick();
        session.start_exercise().unwrap();
        assert_eq!(
            session.cues().0,
            vec![Cue::CountdownGo, Cue::ExerciseEnd, Cue::CountdownGo]
        );
    }

    #[test]
    fn test_active_seconds_match_durations() {
        for countdown_seconds in [0, 3] {
            let config = WorkoutConfig {
                countdown_seconds,
                completion_delay_seconds: 0,
            };
            let mut session =
                WorkoutSession::new(vec![exercise("A", 4), exercise("B", 6)], SilentCues)
                    .unwrap()
                    .with_timing(&config);

            while !session.is_completed() {
                if session.phase() == Phase::Preview {
                    session.start_exercise().unwrap();
                }
                session.tick();
            }
            assert_eq!(session.active_seconds(), 10);
        }
    }

    #[test]
    fn test_skipped_exercise_adds_no_active_time() {
        let mut session =
            WorkoutSession::new(vec![exercise("A", 4), exercise("B", 3)], SilentCues).unwrap();
        session.skip().unwrap();
        session.start_exercise().unwrap();
        while !session.is_completed() {
            session.tick();
        }
        assert_eq!(session.active_seconds(), 3);
    }

    #[test]
    fn test_preview_waits_for_user() {
        let mut session = WorkoutSession::new(vec![exercise("A", 5)], SilentCues).unwrap();
        for _ in 0..10 {
            assert_eq!(session.tick(), WorkoutEvent::Waiting);
        }
        assert_eq!(session.phase(), Phase::Preview);
        assert_eq!(session.seconds_left(), 5);
    }

    #[test]
    fn test_skip_restart_shuffle() {
        let mut session = WorkoutSession::new(
            vec![exercise("A", 10), exercise("B", 20), exercise("C", 30)],
            SilentCues,
        )
        .unwrap();
        assert_eq!(session.total_duration(), 60);

        session.start_exercise().unwrap();
        session.tick();
        session.restart().unwrap();
        assert_eq!(session.phase(), Phase::Preview);
        assert_eq!(session.seconds_left(), 10);

        session.skip().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.seconds_left(), 20);

        session.shuffle(exercise("D", 45)).unwrap();
        assert_eq!(session.current_exercise().name, "D");
        assert_eq!(session.seconds_left(), 45);
        assert_eq!(session.total_duration(), 85);

        session.skip().unwrap();
        session.skip().unwrap();
        assert!(session.is_completed());
        assert!(matches!(session.skip(), Err(Error::InvalidTransition(_))));
        assert!(matches!(session.restart(), Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn test_start_exercise_only_from_preview() {
        let mut session = WorkoutSession::new(vec![exercise("A", 5)], SilentCues).unwrap();
        session.start_exercise().unwrap();
        assert!(matches!(
            session.start_exercise(),
            Err(Error::InvalidTransition(_))
        ));
    }
}
