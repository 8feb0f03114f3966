/// MCP tools for habit management
///
/// This module contains all the MCP tools that external clients can call
/// to interact with the habit tracker. Each tool parses its parameters,
/// runs one lifecycle or analytics operation and renders a reply.

pub mod analytics;
pub mod clear;
pub mod complete;
pub mod create;
pub mod delete;
pub mod list;
pub mod status;
pub mod update;

// Re-export tool functions for easy access
pub use analytics::*;
pub use clear::*;
pub use complete::*;
pub use create::*;
pub use delete::*;
pub use list::*;
pub use status::*;
pub use update::*;

use chrono::NaiveDateTime;

use crate::domain::HabitId;
use crate::lifecycle::LifecycleError;

/// Parse a habit ID argument; malformed IDs cannot name an existing habit
pub(crate) fn parse_habit_id(raw: &str) -> Result<HabitId, LifecycleError> {
    HabitId::from_string(raw).map_err(|_| LifecycleError::HabitNotFound {
        habit_id: raw.to_string(),
    })
}

/// Human-readable date, e.g. "Tuesday, October 15, 2024"
pub(crate) fn format_day(at: NaiveDateTime) -> String {
    at.format("%A, %B %d, %Y").to_string()
}

/// First 8 characters of an ID, for compact listings
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
