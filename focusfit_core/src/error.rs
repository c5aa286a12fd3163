//! Error types for the focusfit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for focusfit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// No exercise matched the user's settings
    #[error("No workout available for the current settings")]
    NoWorkoutAvailable,

    /// A state machine was asked to make a transition it does not allow
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Scheduling or cancelling a notification failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Backend sync error
    #[error("Sync error: {0}")]
    Sync(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
