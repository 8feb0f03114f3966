/// Task entity: one scheduled occurrence of a habit
///
/// A habit always has exactly one task that is not completed yet. When that
/// task is completed a successor is created with the next due date.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, HabitId, TaskId};

/// A single due occurrence of a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by storage on first save
    pub id: Option<TaskId>,
    /// Owning habit; tasks are deleted together with it
    pub habit_id: HabitId,
    pub completed: bool,
    /// Set exactly once, when the task is completed
    pub completed_on: Option<NaiveDateTime>,
    /// Due instant, fixed at creation
    pub expected_completion_by: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    /// Create a new outstanding task for a habit
    pub fn new(habit_id: HabitId, expected_completion_by: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: None,
            habit_id,
            completed: false,
            completed_on: None,
            expected_completion_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the task completed at `now`
    pub fn mark_completed(&mut self, now: NaiveDateTime) -> Result<(), DomainError> {
        if self.completed || self.completed_on.is_some() {
            return Err(DomainError::TaskAlreadyCompleted);
        }

        self.completed = true;
        self.completed_on = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Whether the task was completed no later than its due instant
    pub fn completed_on_time(&self) -> Option<bool> {
        self.completed_on.map(|done| done <= self.expected_completion_by)
    }
}
