/// Basic unit tests for scheduling, streak rules and storage
use chrono::{NaiveDate, NaiveDateTime};
use habit_tracker::*;
use tempfile::NamedTempFile;

fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn eod(m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap().and_hms_opt(23, 59, 59).unwrap()
}

#[cfg(test)]
mod schedule_tests {
    use super::*;

    #[test]
    fn test_first_due_is_end_of_today() {
        for periodicity in [Periodicity::Daily, Periodicity::Weekly] {
            assert_eq!(DueDateScheduler::next_due(periodicity, None, at(10, 15, 8)), eod(10, 15));
        }
    }

    #[test]
    fn test_daily_follows_previous_due_date() {
        let next = DueDateScheduler::next_due(Periodicity::Daily, Some(eod(10, 15)), at(10, 15, 20));
        assert_eq!(next, eod(10, 16));

        // month boundary
        let next = DueDateScheduler::next_due(Periodicity::Daily, Some(eod(10, 31)), at(10, 31, 9));
        assert_eq!(next, eod(11, 1));
    }

    #[test]
    fn test_weekly_keeps_weekday_at_least_a_week_out() {
        let today = at(10, 15, 12); // Tuesday

        let cases = [
            (eod(10, 15), eod(10, 22)), // same weekday as today
            (eod(10, 8), eod(10, 22)),  // a Tuesday a week earlier
            (eod(10, 10), eod(10, 24)), // Thursday
            (eod(10, 14), eod(10, 28)), // Monday
        ];

        for (reference, expected) in cases {
            let next = DueDateScheduler::next_due(Periodicity::Weekly, Some(reference), today);
            assert_eq!(next, expected, "reference {}", reference);
        }
    }
}

#[cfg(test)]
mod streak_tests {
    use super::*;

    #[test]
    fn test_timing_classification() {
        assert_eq!(StreakPolicy::evaluate(at(10, 14, 9), eod(10, 15)), CompletionTiming::NotYetDue);
        assert_eq!(StreakPolicy::evaluate(at(10, 15, 0), eod(10, 15)), CompletionTiming::OnTime);
        assert_eq!(StreakPolicy::evaluate(eod(10, 15), eod(10, 15)), CompletionTiming::OnTime);
        assert_eq!(StreakPolicy::evaluate(at(10, 16, 0), eod(10, 15)), CompletionTiming::Late);
    }

    #[test]
    fn test_longest_never_below_current() {
        let mut counters = StreakCounters::default();
        let timings = [
            CompletionTiming::OnTime,
            CompletionTiming::OnTime,
            CompletionTiming::Late,
            CompletionTiming::OnTime,
            CompletionTiming::NotYetDue,
            CompletionTiming::OnTime,
            CompletionTiming::OnTime,
        ];

        for timing in timings {
            if let Some(next) = StreakPolicy::transition(counters, timing) {
                counters = next;
            }
            assert!(counters.longest >= counters.current);
        }

        assert_eq!(counters, StreakCounters { current: 3, longest: 3 });
    }
}

#[cfg(test)]
mod storage_tests {
    use super::*;

    #[test]
    fn test_storage_is_object_safe() {
        let storage = SqliteStorage::in_memory().expect("Failed to create storage");
        let _: &dyn HabitStorage = &storage;
    }

    #[test]
    fn test_habits_survive_reopening() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");

        let saved = {
            let storage = SqliteStorage::new(temp_file.path()).expect("Failed to create storage");
            let habit = Habit::new("Morning Run", Periodicity::Daily, eod(10, 15), at(10, 15, 9)).unwrap();
            storage.save_habit(&habit).unwrap()
        };

        let storage = SqliteStorage::new(temp_file.path()).expect("Failed to reopen storage");
        let habit_id = saved.id.clone().expect("storage assigns an id");
        let loaded = storage.load_habit(&habit_id).unwrap().expect("habit persisted");

        assert_eq!(loaded.name, saved.name);
        assert_eq!(loaded.periodicity, saved.periodicity);
        assert_eq!(loaded.next_completion_date, saved.next_completion_date);
        assert_eq!(loaded.created_at, saved.created_at);
    }

    #[test]
    fn test_delete_cascades_to_tasks() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit = Habit::new("Read", Periodicity::Weekly, eod(10, 15), at(10, 15, 9)).unwrap();
        let habit = storage.save_habit(&habit).unwrap();
        let habit_id = habit.id.clone().unwrap();
        let task = storage.save_task(&Task::new(habit_id.clone(), eod(10, 15), at(10, 15, 9))).unwrap();

        storage.delete_habit(&habit_id).unwrap();

        assert!(storage.load_habit(&habit_id).unwrap().is_none());
        assert!(storage.load_task(&task.id.unwrap()).unwrap().is_none());
        assert!(storage.load_tasks(&habit_id).unwrap().is_empty());
    }
}
