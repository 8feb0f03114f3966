/// Tool for checking habit status and streaks
///
/// This module implements the habit_status MCP tool.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, Habit, Periodicity, StreakPolicy, Task};
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::{HabitFilter, HabitStorage};
use crate::tools::{format_day, parse_habit_id, short_id};

/// How many completed tasks the recent history shows
const RECENT_LIMIT: usize = 7;

/// Parameters for checking habit status
#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    pub habit_id: Option<String>, // If omitted, returns all habits
    pub include_recent: Option<bool>,
}

/// One completed task in a habit's recent history
#[derive(Debug, Serialize)]
pub struct RecentCompletion {
    pub completed_on: NaiveDateTime,
    pub due_by: NaiveDateTime,
    pub on_time: bool,
}

impl RecentCompletion {
    fn from_task(task: &Task) -> Option<Self> {
        Some(Self {
            completed_on: task.completed_on?,
            due_by: task.expected_completion_by,
            on_time: task.completed_on_time()?,
        })
    }
}

/// Information about a single habit's status
#[derive(Debug, Serialize)]
pub struct HabitStatus {
    pub habit_id: String,
    pub name: String,
    pub periodicity: Periodicity,
    pub created_at: NaiveDateTime,
    pub next_completion_date: NaiveDateTime,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub is_overdue: bool,
    /// Newest first; only filled when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent: Option<Vec<RecentCompletion>>,
}

/// Response from checking habit status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub habits: Vec<HabitStatus>,
    pub summary: String,
    pub message: String,
}

/// Get status for one habit, or for all of them
pub fn get_habit_status<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    params: StatusParams,
) -> Result<StatusResponse, LifecycleError> {
    let include_recent = params.include_recent.unwrap_or(false);
    let now = lifecycle.clock().now();

    let habits = match params.habit_id {
        Some(raw) => vec![lifecycle.get(&parse_habit_id(&raw)?)?],
        None => lifecycle.list(&HabitFilter::default())?,
    };

    let mut statuses = Vec::with_capacity(habits.len());
    for habit in &habits {
        let recent = if include_recent {
            Some(recent_completions(lifecycle, habit)?)
        } else {
            None
        };
        statuses.push(status_of(habit, now, recent));
    }

    let summary = if statuses.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let overdue = statuses.iter().filter(|s| s.is_overdue).count();
        let on_streak = statuses.iter().filter(|s| s.current_streak > 0).count();
        format!(
            "📊 Status: {} habit(s), {} on a streak, {} overdue",
            statuses.len(),
            on_streak,
            overdue
        )
    };

    let details: Vec<String> = statuses.iter().map(render).collect();
    let message = if details.is_empty() {
        summary.clone()
    } else {
        format!("{}\n\n{}", summary, details.join("\n\n"))
    };

    Ok(StatusResponse {
        habits: statuses,
        summary,
        message,
    })
}

fn recent_completions<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    habit: &Habit,
) -> Result<Vec<RecentCompletion>, LifecycleError> {
    let Some(habit_id) = habit.id.as_ref() else {
        return Ok(Vec::new());
    };

    Ok(lifecycle
        .history(habit_id)?
        .iter()
        .rev()
        .filter_map(RecentCompletion::from_task)
        .take(RECENT_LIMIT)
        .collect())
}

fn status_of(habit: &Habit, now: NaiveDateTime, recent: Option<Vec<RecentCompletion>>) -> HabitStatus {
    HabitStatus {
        habit_id: habit.id.as_ref().map(ToString::to_string).unwrap_or_default(),
        name: habit.name.clone(),
        periodicity: habit.periodicity,
        created_at: habit.created_at,
        next_completion_date: habit.next_completion_date,
        current_streak: habit.current_streak,
        longest_streak: habit.longest_streak,
        is_overdue: habit.is_overdue(now),
        recent,
    }
}

fn render(status: &HabitStatus) -> String {
    let mut out = format!(
        "🎯 {} ({}...)\n   {} since {}\n   Current streak: {} | Best: {}\n   {} {}",
        status.name,
        short_id(&status.habit_id),
        status.periodicity,
        format_day(status.created_at),
        status.current_streak,
        status.longest_streak,
        if status.is_overdue { "⚠️ Overdue since end of" } else { "Due by end of" },
        format_day(status.next_completion_date),
    );

    out.push_str("\n   ");
    out.push_str(&StreakPolicy::motivational_message(status.current_streak, status.periodicity));

    if let Some(recent) = &status.recent {
        if recent.is_empty() {
            out.push_str("\n   No completions yet");
        }
        for entry in recent {
            out.push_str(&format!(
                "\n   {} {}",
                if entry.on_time { "✅" } else { "⏰" },
                entry.completed_on.format("%Y-%m-%d %H:%M"),
            ));
        }
    }

    out
}
