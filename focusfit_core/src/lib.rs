#![forbid(unsafe_code)]

//! Core domain model and business logic for FocusFit.
//!
//! This crate provides:
//! - Domain types (exercises, settings, progress, session records)
//! - Exercise catalog and selection
//! - Focus timer and workout state machines
//! - Streaks and achievements
//! - Persistence (key-value store, session history, CSV rollup)
//! - Notification scheduling and backend sync

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod selector;
pub mod clock;
pub mod ticker;
pub mod notify;
pub mod timer;
pub mod workout;
pub mod streak;
pub mod achievements;
pub mod progress;
pub mod settings;
pub mod store;
pub mod history;
pub mod export;
pub mod sync;
pub mod format;
pub mod context;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{catalog_with_custom, default_catalog};
pub use config::Config;
pub use context::AppContext;
pub use clock::{Clock, ManualClock, SystemClock};
pub use ticker::{CancelHandle, Ticker, TickerExit};
pub use notify::{LogNotifier, NotificationRequest, Notifier, StoredNotifier};
pub use selector::{find_alternative, is_eligible, select_workout, Slot};
pub use timer::{FocusTimer, TickOutcome, TimerState};
pub use workout::{Cue, CueSink, Phase, SilentCues, WorkoutEvent, WorkoutSession};
pub use streak::calculate_streak;
pub use achievements::check_achievements;
pub use format::format_time;
