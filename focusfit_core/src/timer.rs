//! Focus timer state machine.
//!
//! While running, remaining time is always recomputed from the absolute end
//! instant (`max(0, ends_at - now)`), never from the number of ticks seen, so
//! missed ticks (suspension, a slow terminal) do not cause drift.
//!
//! Starting schedules exactly one notification for the end instant so the
//! user hears about completion even if nothing is ticking. Scheduling and
//! cancelling are best-effort: failures are logged and the timer carries on.

use crate::clock::Clock;
use crate::notify::{NotificationId, NotificationRequest, Notifier};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Result of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer is not running; nothing changed
    Idle,
    Running { seconds_left: u32 },
    /// Reached zero on this tick
    Completed,
}

pub struct FocusTimer<C: Clock, N: Notifier> {
    clock: C,
    notifier: N,
    duration: u32,
    seconds_left: u32,
    state: TimerState,
    ends_at: Option<DateTime<Utc>>,
    notification: Option<NotificationId>,
    sound: Option<String>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl<C: Clock, N: Notifier> FocusTimer<C, N> {
    pub fn new(duration_secs: u32, clock: C, notifier: N) -> Self {
        Self {
            clock,
            notifier,
            duration: duration_secs,
            seconds_left: duration_secs,
            state: TimerState::Idle,
            ends_at: None,
            notification: None,
            sound: None,
            on_complete: None,
        }
    }

    /// Sound name attached to the completion notification
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Register the callback fired once when the timer reaches zero
    pub fn on_complete(&mut self, f: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    pub fn scheduled_notification(&self) -> Option<&NotificationId> {
        self.notification.as_ref()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Start or resume the timer
    ///
    /// With `Some(duration)` the configured duration is replaced and the
    /// countdown restarts from it. Starting an already running timer does
    /// nothing; resuming a completed timer requires a reset or a duration.
    pub fn start(&mut self, duration: Option<u32>) -> Result<()> {
        if let Some(d) = duration {
            if d == 0 {
                return Err(Error::InvalidInput("timer duration must be positive".into()));
            }
            if self.state == TimerState::Running {
                self.cancel_notification();
            }
            self.duration = d;
            self.seconds_left = d;
        } else {
            match self.state {
                TimerState::Running => {
                    tracing::debug!("Timer already running");
                    return Ok(());
                }
                TimerState::Completed => {
                    return Err(Error::InvalidTransition(
                        "timer has completed; reset it before starting again".into(),
                    ));
                }
                TimerState::Idle | TimerState::Paused => {}
            }
        }

        let now = self.clock.now();
        let ends_at = now + chrono::Duration::seconds(i64::from(self.seconds_left));
        self.ends_at = Some(ends_at);
        self.state = TimerState::Running;

        let mut request =
            NotificationRequest::at(ends_at, "Focus session complete", "Time for a break!");
        request.sound = self.sound.clone();
        match self.notifier.schedule(request) {
            Ok(id) => {
                tracing::debug!("Scheduled completion notification {} for {}", id, ends_at);
                self.notification = Some(id);
            }
            Err(e) => {
                tracing::warn!("Failed to schedule completion notification: {}", e);
                self.notification = None;
            }
        }

        tracing::info!(
            "Timer started with {} seconds left (ends at {})",
            self.seconds_left,
            ends_at
        );
        Ok(())
    }

    /// Pause a running timer, keeping the wall-clock remaining time
    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            tracing::debug!("Pause ignored in state {:?}", self.state);
            return;
        }

        self.seconds_left = self.remaining_from_clock();
        self.ends_at = None;
        self.cancel_notification();

        if self.seconds_left == 0 {
            self.complete();
        } else {
            self.state = TimerState::Paused;
            tracing::info!("Timer paused with {} seconds left", self.seconds_left);
        }
    }

    /// Back to Idle with the full configured duration
    pub fn reset(&mut self) {
        self.cancel_notification();
        self.ends_at = None;
        self.seconds_left = self.duration;
        self.state = TimerState::Idle;
        tracing::info!("Timer reset to {} seconds", self.duration);
    }

    /// Advance the timer; call once per second while running
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Idle;
        }

        self.seconds_left = self.remaining_from_clock();
        if self.seconds_left == 0 {
            self.complete();
            TickOutcome::Completed
        } else {
            TickOutcome::Running {
                seconds_left: self.seconds_left,
            }
        }
    }

    fn remaining_from_clock(&self) -> u32 {
        match self.ends_at {
            Some(ends_at) => {
                let left = (ends_at - self.clock.now()).num_seconds().max(0);
                u32::try_from(left).unwrap_or(u32::MAX)
            }
            None => self.seconds_left,
        }
    }

    fn complete(&mut self) {
        self.seconds_left = 0;
        self.ends_at = None;
        self.state = TimerState::Completed;
        self.cancel_notification();
        tracing::info!("Timer completed");
        if let Some(ref mut callback) = self.on_complete {
            callback();
        }
    }

    fn cancel_notification(&mut self) {
        if let Some(id) = self.notification.take() {
            if let Err(e) = self.notifier.cancel(&id) {
                tracing::warn!("Failed to cancel notification {}: {}", id, e);
            }
        }
    }
}
