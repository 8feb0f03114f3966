/// Lifecycle tests driven by a fixed clock
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use habit_tracker::*;

type Lifecycle = HabitLifecycle<SqliteStorage, Arc<FixedClock>>;

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn eod(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap().and_hms_opt(23, 59, 59).unwrap()
}

fn setup(now: NaiveDateTime) -> (Arc<FixedClock>, Lifecycle) {
    let clock = Arc::new(FixedClock::new(now));
    let storage = SqliteStorage::in_memory().expect("Failed to create storage");
    (clock.clone(), HabitLifecycle::new(storage, clock))
}

/// Exactly one outstanding task, due when the habit says
fn assert_single_outstanding(lifecycle: &Lifecycle, habit_id: &HabitId) {
    let habit = lifecycle.get(habit_id).unwrap();
    let outstanding: Vec<Task> = lifecycle
        .history(habit_id)
        .unwrap()
        .into_iter()
        .filter(|t| !t.completed)
        .collect();

    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].expected_completion_by, habit.next_completion_date);
    assert!(habit.longest_streak >= habit.current_streak);
}

#[cfg(test)]
mod create_tests {
    use super::*;

    #[test]
    fn test_create_schedules_first_task_today() {
        let (_clock, lifecycle) = setup(at(15, 8));
        let habit = lifecycle.create("Morning Run", "daily").unwrap();
        let habit_id = habit.id.clone().unwrap();

        assert_eq!(habit.next_completion_date, eod(15));
        assert_eq!(habit.current_streak, 0);
        assert_eq!(habit.longest_streak, 0);
        assert_single_outstanding(&lifecycle, &habit_id);
    }

    #[test]
    fn test_create_validation() {
        let (_clock, lifecycle) = setup(at(15, 8));

        assert!(matches!(lifecycle.create("", "daily"), Err(LifecycleError::InvalidHabit(_))));
        assert!(matches!(lifecycle.create("Run", "monthly"), Err(LifecycleError::InvalidHabit(_))));
        assert!(lifecycle.list(&HabitFilter::default()).unwrap().is_empty());
    }
}

#[cfg(test)]
mod complete_tests {
    use super::*;

    #[test]
    fn test_daily_streak_grows_and_resets() {
        let (clock, lifecycle) = setup(at(15, 8));
        let habit_id = lifecycle.create("Run", "daily").unwrap().id.unwrap();

        for day in 15..=17 {
            clock.set(at(day, 19));
            let result = lifecycle.complete(&habit_id).unwrap();
            assert!(matches!(result, CompletionResult::Completed { timing: CompletionTiming::OnTime, .. }));
            assert_single_outstanding(&lifecycle, &habit_id);
        }

        let habit = lifecycle.get(&habit_id).unwrap();
        assert_eq!((habit.current_streak, habit.longest_streak), (3, 3));
        assert_eq!(habit.next_completion_date, eod(18));

        // skip the 18th entirely
        clock.set(at(19, 10));
        let result = lifecycle.complete(&habit_id).unwrap();
        assert_eq!(
            result,
            CompletionResult::Completed {
                timing: CompletionTiming::Late,
                current_streak: 0,
                longest_streak: 3,
                next_completion_date: eod(19),
            }
        );
        assert_single_outstanding(&lifecycle, &habit_id);
    }

    #[test]
    fn test_early_completion_changes_nothing() {
        let (clock, lifecycle) = setup(at(15, 8));
        let habit_id = lifecycle.create("Run", "daily").unwrap().id.unwrap();
        lifecycle.complete(&habit_id).unwrap();

        let before = lifecycle.get(&habit_id).unwrap();
        let tasks_before = lifecycle.history(&habit_id).unwrap();

        clock.advance(Duration::hours(2));
        let result = lifecycle.complete(&habit_id).unwrap();

        assert_eq!(result, CompletionResult::NotDueYet { due_by: eod(16) });
        assert_eq!(lifecycle.get(&habit_id).unwrap(), before);
        assert_eq!(lifecycle.history(&habit_id).unwrap(), tasks_before);
    }

    #[test]
    fn test_weekly_completion_keeps_weekday() {
        let (clock, lifecycle) = setup(at(15, 8)); // Tuesday
        let habit_id = lifecycle.create("Review", "weekly").unwrap().id.unwrap();

        let result = lifecycle.complete(&habit_id).unwrap();
        assert!(matches!(
            result,
            CompletionResult::Completed { next_completion_date, .. } if next_completion_date == eod(22)
        ));

        // due on the 22nd; completing on the 20th is too early
        clock.set(at(20, 12));
        assert!(matches!(lifecycle.complete(&habit_id).unwrap(), CompletionResult::NotDueYet { .. }));

        clock.set(at(22, 21));
        let result = lifecycle.complete(&habit_id).unwrap();
        assert!(matches!(
            result,
            CompletionResult::Completed { timing: CompletionTiming::OnTime, current_streak: 2, .. }
        ));
        assert_eq!(lifecycle.get(&habit_id).unwrap().next_completion_date, eod(29));
        assert_single_outstanding(&lifecycle, &habit_id);
    }

    #[test]
    fn test_complete_unknown_habit() {
        let (_clock, lifecycle) = setup(at(15, 8));
        let result = lifecycle.complete(&HabitId::new());
        assert!(matches!(result, Err(LifecycleError::HabitNotFound { .. })));
    }

    #[test]
    fn test_completed_tasks_keep_their_timestamps() {
        let (clock, lifecycle) = setup(at(15, 8));
        let habit_id = lifecycle.create("Run", "daily").unwrap().id.unwrap();

        clock.set(at(15, 22));
        lifecycle.complete(&habit_id).unwrap();

        let history = lifecycle.history(&habit_id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].completed);
        assert_eq!(history[0].completed_on, Some(at(15, 22)));
        assert_eq!(history[0].completed_on_time(), Some(true));
        assert!(!history[1].completed);
        assert_eq!(history[1].expected_completion_by, eod(16));
    }
}

#[cfg(test)]
mod update_delete_tests {
    use super::*;

    #[test]
    fn test_update_renames_only() {
        let (clock, lifecycle) = setup(at(15, 8));
        let habit_id = lifecycle.create("Run", "daily").unwrap().id.unwrap();
        lifecycle.complete(&habit_id).unwrap();

        clock.advance(Duration::minutes(5));
        let updated = lifecycle
            .update(&habit_id, &HabitChanges { name: Some("Evening Run".to_string()) })
            .unwrap();

        assert_eq!(updated.name, "Evening Run");
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.periodicity, Periodicity::Daily);
        assert_eq!(updated.next_completion_date, eod(16));
        assert_single_outstanding(&lifecycle, &habit_id);

        let invalid = lifecycle.update(&habit_id, &HabitChanges { name: Some("  ".to_string()) });
        assert!(matches!(invalid, Err(LifecycleError::InvalidHabit(_))));
        assert_eq!(lifecycle.get(&habit_id).unwrap().name, "Evening Run");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_clock, lifecycle) = setup(at(15, 8));
        let keep = lifecycle.create("Read", "weekly").unwrap().id.unwrap();
        let gone = lifecycle.create("Run", "daily").unwrap().id.unwrap();

        lifecycle.delete(&gone).unwrap();
        lifecycle.delete(&gone).unwrap();
        lifecycle.delete(&HabitId::new()).unwrap();

        let remaining = lifecycle.list(&HabitFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_ref(), Some(&keep));
        assert!(matches!(lifecycle.history(&gone), Err(LifecycleError::HabitNotFound { .. })));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (_clock, lifecycle) = setup(at(15, 8));
        lifecycle.create("Read", "weekly").unwrap();
        lifecycle.create("Run", "daily").unwrap();

        assert_eq!(lifecycle.clear().unwrap(), 2);
        assert!(lifecycle.list(&HabitFilter::default()).unwrap().is_empty());
        assert_eq!(lifecycle.clear().unwrap(), 0);
    }
}

#[cfg(test)]
mod analytics_tests {
    use super::*;

    #[test]
    fn test_longest_streak_queries() {
        let (clock, lifecycle) = setup(at(15, 8));
        let run = lifecycle.create("Run", "daily").unwrap().id.unwrap();
        let read = lifecycle.create("Read", "weekly").unwrap().id.unwrap();

        lifecycle.complete(&read).unwrap();
        for day in 15..=18 {
            clock.set(at(day, 9));
            lifecycle.complete(&run).unwrap();
        }

        let analytics = AnalyticsEngine::new();
        let storage = lifecycle.storage();

        let leader = analytics.longest_streak_overall(storage).unwrap().unwrap();
        assert_eq!(leader.name, "Run");
        assert_eq!(leader.longest_streak, 4);

        assert_eq!(analytics.longest_streak_for(storage, "Read").unwrap(), Some(1));
        assert_eq!(analytics.habits_with_periodicity(storage, Periodicity::Weekly).unwrap().len(), 1);
    }
}
