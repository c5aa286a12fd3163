//! Tracing setup for the `focusfit` binary.
//!
//! Diagnostics go to stderr so they never interleave with command output on
//! stdout. `FOCUSFIT_LOG` takes precedence over `RUST_LOG`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable read before `RUST_LOG`
pub const LOG_ENV: &str = "FOCUSFIT_LOG";

/// Install the global subscriber at WARN unless overridden
pub fn init() {
    init_with_level("warn")
}

/// Install the global subscriber with `default_level` as the fallback filter
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_with_level(default_level: &str) {
    let installed = tracing_subscriber::registry()
        .with(filter_from_env(default_level))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn filter_from_env(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Route logs through the test harness so they show up only for failures
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("focusfit_core=debug"))
        .try_init();
}
