//! Repeating once-per-interval callback.
//!
//! The ticker runs on the calling thread. It stops when the callback returns
//! `ControlFlow::Break` or when its `CancelHandle` is cancelled; after
//! cancellation no further callback runs.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle used to stop a running ticker
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Why a ticker stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerExit {
    /// The callback asked to stop
    Finished,
    /// The cancel handle fired
    Cancelled,
}

pub struct Ticker {
    interval: Duration,
    handle: CancelHandle,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: CancelHandle::default(),
        }
    }

    /// One tick per second
    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// No sleeping between ticks, for simulated runs
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// Run `on_tick` once per interval until it breaks or the ticker is cancelled
    ///
    /// The callback receives the 1-based tick number.
    pub fn run<F>(&self, mut on_tick: F) -> TickerExit
    where
        F: FnMut(u64) -> ControlFlow<()>,
    {
        let mut count: u64 = 0;
        loop {
            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
            if self.handle.is_cancelled() {
                tracing::debug!("Ticker cancelled after {} ticks", count);
                return TickerExit::Cancelled;
            }
            count += 1;
            if on_tick(count).is_break() {
                tracing::debug!("Ticker finished after {} ticks", count);
                return TickerExit::Finished;
            }
        }
    }
}
