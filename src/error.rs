//! Error types for the pulsefit core.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug)]
pub enum FitError {
    /// Template has no name or no exercises, or an exercise plan is invalid.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// A workout is already running.
    #[error("a workout is already active (`{active}`); end it before starting another")]
    Conflict { active: String },

    #[error("no active workout")]
    NoActiveSession,

    /// The (exercise, set) pair does not exist in the running template.
    #[error("exercise {exercise} has no set {set}")]
    UnknownSet { exercise: usize, set: usize },

    /// A required field of a measurement or meal is missing.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FitError>;
