/// Habit entity and related functionality
///
/// This module defines the Habit struct: a recurring commitment with a
/// periodicity, streak counters and the due date of its outstanding task.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CompletionTiming, DomainError, HabitId, Periodicity, StreakCounters, StreakPolicy,
};

/// Longest habit name accepted
const MAX_NAME_LEN: usize = 100;

/// A habit the user wants to keep up
///
/// `next_completion_date` always mirrors the `expected_completion_by` of the
/// habit's single outstanding task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Assigned by storage on first save; `None` until then
    pub id: Option<HabitId>,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Fixed at creation
    pub periodicity: Periodicity,
    /// Consecutive on-time completions ending at the most recent one
    pub current_streak: u32,
    /// Best streak ever achieved, never below `current_streak`
    pub longest_streak: u32,
    /// When the outstanding task is due
    pub next_completion_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields of a habit that callers may change outside the completion flow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitChanges {
    pub name: Option<String>,
}

impl HabitChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

impl Habit {
    /// Create a new, not yet persisted habit with zeroed streaks
    ///
    /// The caller supplies the first due date (computed by the scheduler) and
    /// the instant of creation.
    pub fn new(
        name: &str,
        periodicity: Periodicity,
        next_completion_date: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(name)?;

        Ok(Self {
            id: None,
            name,
            periodicity,
            current_streak: 0,
            longest_streak: 0,
            next_completion_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Streak counters as a value
    pub fn streak(&self) -> StreakCounters {
        StreakCounters {
            current: self.current_streak,
            longest: self.longest_streak,
        }
    }

    /// Apply the streak transition for a completion with the given timing
    ///
    /// Fails for `NotYetDue`, which must never reach a mutation.
    pub fn record_completion(
        &mut self,
        timing: CompletionTiming,
        now: NaiveDateTime,
    ) -> Result<StreakCounters, DomainError> {
        let next = StreakPolicy::transition(self.streak(), timing)
            .ok_or(DomainError::NotYetDue { due_by: self.next_completion_date })?;

        self.current_streak = next.current;
        self.longest_streak = next.longest;
        self.updated_at = now;
        Ok(next)
    }

    /// Point the habit at its new outstanding task's due date
    pub fn reschedule(&mut self, next_completion_date: NaiveDateTime, now: NaiveDateTime) {
        self.next_completion_date = next_completion_date;
        self.updated_at = now;
    }

    /// Apply externally requested changes, validating them first
    ///
    /// Returns whether anything was actually changed.
    pub fn apply_changes(&mut self, changes: &HabitChanges, now: NaiveDateTime) -> Result<bool, DomainError> {
        let Some(new_name) = changes.name.as_deref() else {
            return Ok(false);
        };

        let new_name = Self::validate_name(new_name)?;
        if new_name == self.name {
            return Ok(false);
        }

        self.name = new_name;
        self.updated_at = now;
        Ok(true)
    }

    /// Whether the outstanding task's due instant has passed
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        now > self.next_completion_date
    }

    /// Validate habit name according to business rules
    ///
    /// Returns the trimmed name.
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabit("Habit name cannot be empty".to_string()));
        }

        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::InvalidHabit(format!(
                "Habit name cannot be longer than {} characters",
                MAX_NAME_LEN
            )));
        }

        Ok(trimmed.to_string())
    }
}
