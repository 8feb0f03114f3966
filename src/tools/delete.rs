/// Tool for deleting habits
///
/// This module implements the habit_delete MCP tool. Deleting a habit that
/// does not exist succeeds without touching storage.

use serde::{Deserialize, Serialize};

use crate::domain::{Clock, HabitId};
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::HabitStorage;

/// Parameters for deleting a habit
#[derive(Debug, Deserialize)]
pub struct DeleteHabitParams {
    pub habit_id: String,
}

/// Response from deleting a habit
#[derive(Debug, Serialize)]
pub struct DeleteHabitResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a habit together with its task history
pub fn delete_habit<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: DeleteHabitParams,
) -> Result<DeleteHabitResponse, LifecycleError> {
    // A malformed ID names no habit, which makes the delete a no-op
    if let Ok(habit_id) = HabitId::from_string(&params.habit_id) {
        lifecycle.delete(&habit_id)?;
    }

    Ok(DeleteHabitResponse {
        success: true,
        message: format!("🗑️ Habit {} deleted.", params.habit_id.trim()),
    })
}
