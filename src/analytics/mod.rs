/// Analytics engine for read-only habit queries
///
/// These are projections over stored habits: listing, filtering by
/// periodicity and finding the best streaks. Nothing here mutates data.

use serde::Serialize;

use crate::domain::{Habit, Periodicity};
use crate::storage::{HabitFilter, HabitStorage, StorageError};

/// The habit holding the longest streak
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakLeader {
    pub habit_id: String,
    pub name: String,
    pub periodicity: Periodicity,
    pub longest_streak: u32,
}

impl From<&Habit> for StreakLeader {
    fn from(habit: &Habit) -> Self {
        Self {
            habit_id: habit.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            name: habit.name.clone(),
            periodicity: habit.periodicity,
            longest_streak: habit.longest_streak,
        }
    }
}

/// Analytics engine for processing habit data
#[derive(Debug, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new() -> Self {
        Self
    }

    /// Every habit, oldest first
    pub fn all_habits<S: HabitStorage>(&self, storage: &S) -> Result<Vec<Habit>, StorageError> {
        storage.load_habits(&HabitFilter::default())
    }

    /// Habits with the given periodicity
    pub fn habits_with_periodicity<S: HabitStorage>(
        &self,
        storage: &S,
        periodicity: Periodicity,
    ) -> Result<Vec<Habit>, StorageError> {
        storage.load_habits(&HabitFilter::by_periodicity(periodicity))
    }

    /// The habit with the highest longest streak
    ///
    /// On a tie the habit created first wins. `None` when there are no habits.
    pub fn longest_streak_overall<S: HabitStorage>(
        &self,
        storage: &S,
    ) -> Result<Option<StreakLeader>, StorageError> {
        let habits = self.all_habits(storage)?;
        Ok(Self::leader(&habits))
    }

    /// Longest streak among habits with exactly this name
    ///
    /// Names are not unique, so the best of all matches is returned.
    pub fn longest_streak_for<S: HabitStorage>(
        &self,
        storage: &S,
        name: &str,
    ) -> Result<Option<u32>, StorageError> {
        let habits = storage.load_habits(&HabitFilter::by_name(name.trim()))?;
        Ok(habits.iter().map(|h| h.longest_streak).max())
    }

    fn leader(habits: &[Habit]) -> Option<StreakLeader> {
        habits
            .iter()
            .fold(None::<&Habit>, |best, habit| match best {
                Some(b) if b.longest_streak >= habit.longest_streak => Some(b),
                _ => Some(habit),
            })
            .map(StreakLeader::from)
    }
}
