/// Tool for creating new habits
///
/// This module implements the habit_create MCP tool.

use serde::{Deserialize, Serialize};

use crate::domain::Clock;
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::HabitStorage;
use crate::tools::format_day;

/// Parameters for creating a new habit
#[derive(Debug, Deserialize)]
pub struct CreateHabitParams {
    pub name: String,
    pub periodicity: String, // parsed to Periodicity by the lifecycle
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub success: bool,
    pub habit_id: Option<String>,
    pub message: String,
}

/// Create a new habit and schedule its first task
pub fn create_habit<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, LifecycleError> {
    let habit = lifecycle.create(&params.name, &params.periodicity)?;

    Ok(CreateHabitResponse {
        success: true,
        habit_id: habit.id.as_ref().map(ToString::to_string),
        message: format!(
            "✅ Created {} habit '{}'! First due by end of {}.",
            habit.periodicity,
            habit.name,
            format_day(habit.next_completion_date)
        ),
    })
}
