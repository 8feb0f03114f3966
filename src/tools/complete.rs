/// Tool for marking a habit's current task as done
///
/// This module implements the habit_complete MCP tool.

use serde::{Deserialize, Serialize};

use crate::domain::{Clock, CompletionTiming, StreakPolicy};
use crate::lifecycle::{CompletionResult, HabitLifecycle, LifecycleError};
use crate::storage::HabitStorage;
use crate::tools::{format_day, parse_habit_id};

/// Parameters for completing a habit
#[derive(Debug, Deserialize)]
pub struct CompleteHabitParams {
    pub habit_id: String,
}

/// Response from completing a habit
#[derive(Debug, Serialize)]
pub struct CompleteHabitResponse {
    /// False when the habit was not due yet
    pub success: bool,
    pub message: String,
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
}

/// Complete the outstanding task of a habit
pub fn complete_habit<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: CompleteHabitParams,
) -> Result<CompleteHabitResponse, LifecycleError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let result = lifecycle.complete(&habit_id)?;

    let response = match result {
        CompletionResult::NotDueYet { due_by } => CompleteHabitResponse {
            success: false,
            message: format!(
                "⏳ Not due yet. The next completion opens on {}.",
                format_day(due_by)
            ),
            current_streak: None,
            longest_streak: None,
        },
        CompletionResult::Completed { timing, current_streak, longest_streak, next_completion_date } => {
            let periodicity = lifecycle.get(&habit_id)?.periodicity;
            let headline = match timing {
                CompletionTiming::Late => "⚠️ Completed late, streak reset.",
                _ => "🔥 Habit marked as completed!",
            };

            CompleteHabitResponse {
                success: true,
                message: format!(
                    "{} {}\nCurrent streak: {} | Longest streak: {}\nNext due by end of {}",
                    headline,
                    StreakPolicy::motivational_message(current_streak, periodicity),
                    current_streak,
                    longest_streak,
                    format_day(next_completion_date)
                ),
                current_streak: Some(current_streak),
                longest_streak: Some(longest_streak),
            }
        }
    };

    Ok(response)
}
