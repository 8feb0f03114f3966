/// Tool for streak and periodicity analytics
///
/// This module implements the habit_analytics MCP tool, a thin front for
/// the read-only queries in `AnalyticsEngine`.

use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, StreakLeader};
use crate::domain::{Clock, Periodicity};
use crate::lifecycle::{HabitLifecycle, LifecycleError};
use crate::storage::HabitStorage;
use crate::tools::short_id;

/// Which analytics question to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsQuery {
    LongestOverall,
    LongestForHabit,
    ByPeriodicity,
}

/// Parameters for an analytics query
#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub query: AnalyticsQuery,
    /// Required for `longest_for_habit`
    pub name: Option<String>,
    /// Required for `by_periodicity`
    pub periodicity: Option<String>,
}

/// A habit in a periodicity listing
#[derive(Debug, Serialize)]
pub struct PeriodicityEntry {
    pub habit_id: String,
    pub name: String,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Response from an analytics query
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<StreakLeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_streak: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub habits: Vec<PeriodicityEntry>,
    pub message: String,
}

impl AnalyticsResponse {
    fn message_only(message: String) -> Self {
        Self {
            leader: None,
            longest_streak: None,
            habits: Vec::new(),
            message,
        }
    }
}

/// Answer an analytics query over the stored habits
pub fn run_analytics<S: HabitStorage, C: Clock>(
    lifecycle: &HabitLifecycle<S, C>,
    analytics: &AnalyticsEngine,
    params: AnalyticsParams,
) -> Result<AnalyticsResponse, LifecycleError> {
    let storage = lifecycle.storage();

    match params.query {
        AnalyticsQuery::LongestOverall => {
            let leader = analytics.longest_streak_overall(storage)?;
            let message = match &leader {
                Some(l) => format!(
                    "🏆 Longest streak: '{}' ({}) with {} {}",
                    l.name,
                    l.periodicity,
                    l.longest_streak,
                    l.periodicity.unit(l.longest_streak)
                ),
                None => "No habits yet, so no streaks to compare.".to_string(),
            };
            Ok(AnalyticsResponse { leader, ..AnalyticsResponse::message_only(message) })
        }
        AnalyticsQuery::LongestForHabit => {
            let name = params
                .name
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| LifecycleError::InvalidHabit("name is required for longest_for_habit".to_string()))?;

            let longest = analytics.longest_streak_for(storage, &name)?;
            let message = match longest {
                Some(n) => format!("📈 Longest streak for '{}': {}", name.trim(), n),
                None => format!("No habit named '{}'.", name.trim()),
            };
            Ok(AnalyticsResponse { longest_streak: longest, ..AnalyticsResponse::message_only(message) })
        }
        AnalyticsQuery::ByPeriodicity => {
            let raw = params.periodicity.ok_or_else(|| {
                LifecycleError::UnsupportedPeriodicity("periodicity is required for by_periodicity".to_string())
            })?;
            let periodicity: Periodicity = raw.parse()?;

            let habits: Vec<PeriodicityEntry> = analytics
                .habits_with_periodicity(storage, periodicity)?
                .into_iter()
                .map(|h| PeriodicityEntry {
                    habit_id: h.id.as_ref().map(ToString::to_string).unwrap_or_default(),
                    name: h.name,
                    current_streak: h.current_streak,
                    longest_streak: h.longest_streak,
                })
                .collect();

            let lines: Vec<String> = habits
                .iter()
                .map(|h| format!("  • {} ({}...) streak {}", h.name, short_id(&h.habit_id), h.current_streak))
                .collect();
            let message = format!("{} {} habit(s)\n{}", habits.len(), periodicity, lines.join("\n"));

            Ok(AnalyticsResponse { habits, ..AnalyticsResponse::message_only(message) })
        }
    }
}
