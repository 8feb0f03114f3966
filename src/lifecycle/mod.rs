/// Habit lifecycle orchestration
///
/// `HabitLifecycle` composes the clock, the due date scheduler and the
/// streak policy into the create / complete / update / delete operations,
/// persisting through a `HabitStorage`. After every successful operation
/// each habit has exactly one outstanding task, due at the habit's
/// `next_completion_date`.
///
/// The clock is read once per operation. Multi-record writes run inside
/// `HabitStorage::atomically`, so a failure leaves nothing half-applied.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    Clock, CompletionTiming, DomainError, DueDateScheduler, Habit, HabitChanges, HabitId,
    Periodicity, StreakPolicy, Task,
};
use crate::storage::{HabitFilter, HabitStorage, StorageError};

/// Errors returned by lifecycle operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Invalid habit: {0}")]
    InvalidHabit(String),

    #[error("Unsupported periodicity: {0}")]
    UnsupportedPeriodicity(String),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Habit {habit_id} has no outstanding task")]
    NoOutstandingTask { habit_id: String },

    #[error(transparent)]
    Domain(DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<DomainError> for LifecycleError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidHabit(message) => LifecycleError::InvalidHabit(message),
            DomainError::UnsupportedPeriodicity(value) => LifecycleError::UnsupportedPeriodicity(value),
            other => LifecycleError::Domain(other),
        }
    }
}

/// Outcome of a completion attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CompletionResult {
    /// The outstanding task is due on a later day; nothing was changed
    NotDueYet { due_by: NaiveDateTime },
    /// The task was completed and a successor scheduled
    Completed {
        timing: CompletionTiming,
        current_streak: u32,
        longest_streak: u32,
        next_completion_date: NaiveDateTime,
    },
}

/// Orchestrates habit operations against a storage port
///
/// The lifecycle owns its storage for its whole lifetime; callers go through
/// it one operation at a time.
pub struct HabitLifecycle<S, C> {
    storage: S,
    clock: C,
}

impl<S: HabitStorage, C: Clock> HabitLifecycle<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Create a habit and its first outstanding task, due by the end of today
    pub fn create(&self, name: &str, periodicity: &str) -> Result<Habit, LifecycleError> {
        let periodicity: Periodicity = periodicity
            .parse()
            .map_err(|e: DomainError| LifecycleError::InvalidHabit(e.to_string()))?;

        let now = self.clock.now();
        let first_due = DueDateScheduler::next_due(periodicity, None, now);
        let habit = Habit::new(name, periodicity, first_due, now)?;

        let habit = self.storage.atomically(|storage| -> Result<Habit, LifecycleError> {
            let habit = storage.save_habit(&habit)?;
            let habit_id = habit.id.clone().ok_or(StorageError::MissingId)?;
            storage.save_task(&Task::new(habit_id, first_due, now))?;
            Ok(habit)
        })?;

        info!(
            "Created {} habit '{}' ({}), first due {}",
            habit.periodicity,
            habit.name,
            display_id(&habit),
            habit.next_completion_date
        );
        Ok(habit)
    }

    /// Complete the habit's outstanding task
    ///
    /// Returns `NotDueYet` without touching anything when the task is due on
    /// a later calendar day.
    pub fn complete(&self, habit_id: &HabitId) -> Result<CompletionResult, LifecycleError> {
        let now = self.clock.now();
        let mut habit = self.load_existing(habit_id)?;

        let mut task = self.storage.load_outstanding_task(habit_id)?.ok_or_else(|| {
            warn!("Habit {} has no outstanding task", habit_id);
            LifecycleError::NoOutstandingTask { habit_id: habit_id.to_string() }
        })?;

        let due_by = task.expected_completion_by;
        let timing = StreakPolicy::evaluate(now, due_by);
        if timing == CompletionTiming::NotYetDue {
            debug!("Habit {} is not due until {}", habit_id, due_by);
            return Ok(CompletionResult::NotDueYet { due_by });
        }

        task.mark_completed(now)?;
        let counters = habit.record_completion(timing, now)?;
        let next_due = DueDateScheduler::next_due(habit.periodicity, Some(due_by), now);
        habit.reschedule(next_due, now);

        self.storage.atomically(|storage| -> Result<(), LifecycleError> {
            storage.save_task(&task)?;
            storage.save_habit(&habit)?;
            storage.save_task(&Task::new(habit_id.clone(), next_due, now))?;
            Ok(())
        })?;

        info!(
            "Completed habit '{}' ({:?}): streak {} (best {}), next due {}",
            habit.name, timing, counters.current, counters.longest, next_due
        );

        Ok(CompletionResult::Completed {
            timing,
            current_streak: counters.current,
            longest_streak: counters.longest,
            next_completion_date: next_due,
        })
    }

    /// Apply whitelisted field changes (currently only the name)
    pub fn update(&self, habit_id: &HabitId, changes: &HabitChanges) -> Result<Habit, LifecycleError> {
        let now = self.clock.now();
        let mut habit = self.load_existing(habit_id)?;

        if !habit.apply_changes(changes, now)? {
            debug!("No changes for habit {}", habit_id);
            return Ok(habit);
        }

        let habit = self.storage.save_habit(&habit)?;
        info!("Updated habit {}: name is now '{}'", habit_id, habit.name);
        Ok(habit)
    }

    /// Delete a habit and its tasks; deleting a missing habit is a no-op
    pub fn delete(&self, habit_id: &HabitId) -> Result<(), LifecycleError> {
        let Some(habit) = self.storage.load_habit(habit_id)? else {
            debug!("Delete of unknown habit {} ignored", habit_id);
            return Ok(());
        };

        self.storage.delete_habit(habit_id)?;
        info!("Deleted habit '{}' ({})", habit.name, habit_id);
        Ok(())
    }

    /// Delete every habit and task, returning how many habits were removed
    pub fn clear(&self) -> Result<usize, LifecycleError> {
        let deleted = self.storage.delete_all_habits()?;
        info!("Cleared {} habits", deleted);
        Ok(deleted)
    }

    /// List habits matching the filter
    pub fn list(&self, filter: &HabitFilter) -> Result<Vec<Habit>, LifecycleError> {
        Ok(self.storage.load_habits(filter)?)
    }

    /// Look up one habit
    pub fn get(&self, habit_id: &HabitId) -> Result<Habit, LifecycleError> {
        self.load_existing(habit_id)
    }

    /// A habit's task history, oldest first
    pub fn history(&self, habit_id: &HabitId) -> Result<Vec<Task>, LifecycleError> {
        self.load_existing(habit_id)?;
        Ok(self.storage.load_tasks(habit_id)?)
    }

    fn load_existing(&self, habit_id: &HabitId) -> Result<Habit, LifecycleError> {
        self.storage
            .load_habit(habit_id)?
            .ok_or_else(|| LifecycleError::HabitNotFound { habit_id: habit_id.to_string() })
    }
}

fn display_id(habit: &Habit) -> String {
    habit.id.as_ref().map(ToString::to_string).unwrap_or_default()
}
