/// Streak rules for completing a habit's outstanding task
///
/// This module decides whether a completion attempt is early, on time or
/// late, and how each outcome moves a habit's streak counters.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Periodicity;

/// How a completion attempt relates to the task's due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTiming {
    /// The due date is on a later calendar day; the task cannot be completed yet
    NotYetDue,
    /// Completed on the due day, at or before the due instant
    OnTime,
    /// Completed after the due instant
    Late,
}

/// Current and longest streak for a habit
///
/// `longest >= current` holds after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakCounters {
    pub current: u32,
    pub longest: u32,
}

/// Pure streak rules; holds no state
pub struct StreakPolicy;

impl StreakPolicy {
    /// Classify a completion attempt made at `now` for a task due at `due_by`
    pub fn evaluate(now: NaiveDateTime, due_by: NaiveDateTime) -> CompletionTiming {
        if due_by.date() > now.date() {
            CompletionTiming::NotYetDue
        } else if now <= due_by {
            CompletionTiming::OnTime
        } else {
            CompletionTiming::Late
        }
    }

    /// Apply a timing outcome to the counters
    ///
    /// Returns `None` for `NotYetDue`: an early completion is rejected and
    /// must not change anything.
    pub fn transition(counters: StreakCounters, timing: CompletionTiming) -> Option<StreakCounters> {
        match timing {
            CompletionTiming::NotYetDue => None,
            CompletionTiming::OnTime => {
                let current = counters.current.saturating_add(1);
                Some(StreakCounters {
                    current,
                    longest: counters.longest.max(current),
                })
            }
            CompletionTiming::Late => Some(StreakCounters {
                current: 0,
                longest: counters.longest,
            }),
        }
    }

    /// Get a motivational message based on the current streak
    pub fn motivational_message(current_streak: u32, periodicity: Periodicity) -> String {
        let unit = periodicity.unit(current_streak);
        match current_streak {
            0 => "Streak reset. Every journey begins with a single step, start again today.".to_string(),
            1 => format!("Great start! One {} down, keep the momentum going.", unit),
            2..=6 => format!("Nice work! {} {} in a row. You're building a strong habit.", current_streak, unit),
            7..=13 => format!("Excellent! {} {} strong. You're in the groove now!", current_streak, unit),
            14..=29 => format!("Amazing! {} {} straight. This is becoming second nature.", current_streak, unit),
            _ => format!("Legendary! {} {} of unwavering commitment.", current_streak, unit),
        }
    }
}
