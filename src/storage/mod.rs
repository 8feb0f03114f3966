/// Storage layer for persisting habit data
///
/// This module defines the storage port the lifecycle works against and
/// its SQLite implementation. Habits and their tasks live in two tables.

pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use sqlite::*;

use thiserror::Error;

use crate::domain::{Habit, HabitId, Periodicity, Task, TaskId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Record has not been saved yet (no id)")]
    MissingId,

    #[error("Habit {habit_id} has {count} outstanding tasks, expected at most one")]
    MultipleOutstandingTasks { habit_id: String, count: usize },

    #[error("Corrupt {column} value in database: {value}")]
    CorruptRecord { column: &'static str, value: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Optional filters for listing habits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitFilter {
    /// Exact habit name
    pub name: Option<String>,
    pub periodicity: Option<Periodicity>,
}

impl HabitFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), periodicity: None }
    }

    pub fn by_periodicity(periodicity: Periodicity) -> Self {
        Self { name: None, periodicity: Some(periodicity) }
    }
}

/// Trait defining the storage interface for habits and tasks
///
/// Saves insert when the record has no id yet (assigning one) and update
/// otherwise. `updated_at` is persisted as given; the entity's mutators
/// refresh it with the operation's instant. Lookups return `Ok(None)` for
/// missing records rather than an error.
pub trait HabitStorage {
    /// Get a habit by ID
    fn load_habit(&self, habit_id: &HabitId) -> Result<Option<Habit>, StorageError>;

    /// List habits matching the filter, oldest first
    fn load_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>, StorageError>;

    /// Insert or update a habit, returning the stored version
    fn save_habit(&self, habit: &Habit) -> Result<Habit, StorageError>;

    /// Delete a habit together with all of its tasks
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// Delete every habit and task
    fn delete_all_habits(&self) -> Result<usize, StorageError>;

    /// The single incomplete task of a habit, if there is one
    ///
    /// More than one is a broken invariant and fails with
    /// `MultipleOutstandingTasks`.
    fn load_outstanding_task(&self, habit_id: &HabitId) -> Result<Option<Task>, StorageError>;

    /// Get a task by ID
    fn load_task(&self, task_id: &TaskId) -> Result<Option<Task>, StorageError>;

    /// All tasks of a habit in creation order
    fn load_tasks(&self, habit_id: &HabitId) -> Result<Vec<Task>, StorageError>;

    /// Insert or update a task, returning the stored version
    fn save_task(&self, task: &Task) -> Result<Task, StorageError>;

    /// Run `f` so that all of its writes are committed together or not at all
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>;
}
