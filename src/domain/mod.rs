/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Task) and the pure rules
/// that drive them: due date scheduling and streak transitions. Nothing in
/// here touches storage; "now" always comes in through a `Clock`.

pub mod clock;
pub mod habit;
pub mod schedule;
pub mod streak;
pub mod task;
pub mod types;

// Re-export public types for easy access
pub use clock::*;
pub use habit::*;
pub use schedule::*;
pub use streak::*;
pub use task::*;
pub use types::*;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid habit: {0}")]
    InvalidHabit(String),

    #[error("Unsupported periodicity '{0}' (expected 'daily' or 'weekly')")]
    UnsupportedPeriodicity(String),

    #[error("Task is not due yet (due by {due_by})")]
    NotYetDue { due_by: NaiveDateTime },

    #[error("Task has already been completed")]
    TaskAlreadyCompleted,
}
