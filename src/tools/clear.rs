/// Tool for wiping all habits
///
/// This module implements the habit_clear MCP tool. Nothing is deleted
/// unless the caller passes `confirm: true`.

use serde::{Deserialize, Serialize};

use crate::domain::Clock;
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::HabitStorage;

/// Parameters for clearing the database
#[derive(Debug, Deserialize)]
pub struct ClearHabitsParams {
    #[serde(default)]
    pub confirm: bool,
}

/// Response from clearing the database
#[derive(Debug, Serialize)]
pub struct ClearHabitsResponse {
    pub success: bool,
    pub deleted: usize,
    pub message: String,
}

/// Delete every habit and task
pub fn clear_habits<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: ClearHabitsParams,
) -> Result<ClearHabitsResponse, LifecycleError> {
    if !params.confirm {
        return Ok(ClearHabitsResponse {
            success: false,
            deleted: 0,
            message: "Refusing to delete all habits without confirm: true.".to_string(),
        });
    }

    let deleted = lifecycle.clear()?;

    Ok(ClearHabitsResponse {
        success: true,
        deleted,
        message: format!("🧹 Deleted {} habit(s) and their history.", deleted),
    })
}
