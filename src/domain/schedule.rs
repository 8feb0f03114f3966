/// Due date calculation for habit tasks
///
/// Every due date is anchored to the end of a calendar day (23:59:59.000):
/// a task is "due by end of day". The rules differ per periodicity:
///
/// - first due date (no previous task): today
/// - daily: the day after the previous due date
/// - weekly: the first day at least 7 days after today that falls on the
///   weekday of the previous due date (so 7 to 13 days out)

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::Periodicity;

/// Pure due date rules; holds no state
pub struct DueDateScheduler;

impl DueDateScheduler {
    /// Compute the due timestamp that replaces `reference`
    ///
    /// `reference` is the due date being superseded, or `None` for a habit's
    /// very first task. `now` is the instant of the operation asking.
    pub fn next_due(
        periodicity: Periodicity,
        reference: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> NaiveDateTime {
        let today = now.date();

        let due_day = match (periodicity, reference) {
            (_, None) => today,
            (Periodicity::Daily, Some(previous)) => previous.date() + Duration::days(1),
            (Periodicity::Weekly, Some(previous)) => Self::next_weekly_day(today, previous.date()),
        };

        Self::end_of_day(due_day)
    }

    /// Anchor a calendar day at 23:59:59.000
    pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
        day.and_time(Self::end_of_day_time())
    }

    fn end_of_day_time() -> NaiveTime {
        NaiveTime::from_hms_opt(23, 59, 59).expect("23:59:59 is a valid time of day")
    }

    /// First day on `previous`'s weekday that is at least a week after `today`
    ///
    /// Weekdays are compared Monday = 0 .. Sunday = 6. When today already is
    /// that weekday the answer is exactly 7 days from today; otherwise the
    /// nearest matching day (1..=6 days out) is pushed one more week.
    fn next_weekly_day(today: NaiveDate, previous: NaiveDate) -> NaiveDate {
        let target = previous.weekday().num_days_from_monday() as i64;
        let current = today.weekday().num_days_from_monday() as i64;

        let mut days_ahead = (target - current).rem_euclid(7);
        if days_ahead == 0 {
            days_ahead = 7;
        }
        if days_ahead < 7 {
            days_ahead += 7;
        }

        today + Duration::days(days_ahead)
    }
}
