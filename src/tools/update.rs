/// Tool for updating existing habits
///
/// This module implements the habit_update MCP tool. Only the name can be
/// changed: periodicity is fixed at creation and streaks move only through
/// completions, so any other field is rejected when the parameters are parsed.

use serde::{Deserialize, Serialize};

use crate::domain::{Clock, HabitChanges};
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::HabitStorage;
use crate::tools::parse_habit_id;

/// Parameters for updating an existing habit
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateHabitParams {
    pub habit_id: String,
    pub name: Option<String>,
}

/// Response from updating a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub success: bool,
    pub message: String,
}

/// Update an existing habit
pub fn update_habit<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, LifecycleError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let changes = HabitChanges { name: params.name };

    if changes.is_empty() {
        return Ok(UpdateHabitResponse {
            success: false,
            message: "Nothing to update. Only the habit name can be changed.".to_string(),
        });
    }

    let habit = lifecycle.update(&habit_id, &changes)?;

    Ok(UpdateHabitResponse {
        success: true,
        message: format!("✅ Updated habit '{}'", habit.name),
    })
}
