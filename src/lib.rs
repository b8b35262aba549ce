//! Workout tracking core: templates, the live workout state machine with its
//! rest and elapsed timers, and statistics over stored history.
//!
//! Storage and announcements are injected through [`storage::PersistentStore`]
//! and [`notify::NotificationSink`]; nothing in this crate prints.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod tracker;
pub mod types;
pub mod utils;

pub use error::{FitError, Result};
pub use models::{ExercisePlan, LoggedSet, MealEntry, Measurement, SetId, WorkoutHistoryRecord, WorkoutTemplate};
pub use session::{NextStep, SetCompletion, WorkoutSession};
pub use storage::{Collection, MemoryStore, PersistentStore, SqliteStore};
pub use tracker::WorkoutTracker;
pub use types::MuscleGroup;
