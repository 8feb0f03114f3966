/// Tool for listing habits
///
/// This module implements the habit_list MCP tool.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, Habit, Periodicity};
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::{HabitFilter, HabitStorage};
use crate::tools::{format_day, short_id};

/// Parameters for listing habits
#[derive(Debug, Default, Deserialize)]
pub struct ListHabitsParams {
    pub periodicity: Option<String>,
    pub name: Option<String>,
}

/// Information about a habit in the list
#[derive(Debug, Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub periodicity: Periodicity,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub next_due: String,
    pub is_overdue: bool,
}

impl HabitSummary {
    fn from_habit(habit: &Habit, now: NaiveDateTime) -> Self {
        Self {
            habit_id: habit.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            name: habit.name.clone(),
            periodicity: habit.periodicity,
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            next_due: format_day(habit.next_completion_date),
            is_overdue: habit.is_overdue(now),
        }
    }
}

/// Response from listing habits
#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitSummary>,
    pub message: String,
}

/// List habits, optionally filtered by periodicity and exact name
pub fn list_habits<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: ListHabitsParams,
) -> Result<ListHabitsResponse, LifecycleError> {
    let periodicity = params
        .periodicity
        .as_deref()
        .map(str::parse::<Periodicity>)
        .transpose()?;

    let filter = HabitFilter {
        name: params.name.map(|n| n.trim().to_string()),
        periodicity,
    };

    let now = lifecycle.clock().now();
    let habits: Vec<HabitSummary> = lifecycle
        .list(&filter)?
        .iter()
        .map(|habit| HabitSummary::from_habit(habit, now))
        .collect();

    let message = if habits.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let lines: Vec<String> = habits
            .iter()
            .map(|h| {
                format!(
                    "{} {} ({}, {}...) streak {} | best {} | due {}",
                    if h.is_overdue { "⚠️" } else { "🎯" },
                    h.name,
                    h.periodicity,
                    short_id(&h.habit_id),
                    h.current_streak,
                    h.longest_streak,
                    h.next_due
                )
            })
            .collect();
        format!("📋 {} habit(s):\n{}", habits.len(), lines.join("\n"))
    };

    Ok(ListHabitsResponse { habits, message })
}
