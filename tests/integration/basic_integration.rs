/// Basic integration tests
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use habit_tracker::*;
use tempfile::NamedTempFile;

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_server_starts_on_fresh_database() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitTrackerServer::new(temp_file.path().to_path_buf())
            .await
            .expect("Failed to create server");

        let habits = server.lifecycle().list(&HabitFilter::default()).unwrap();
        assert!(habits.is_empty());
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();
        let clock = Arc::new(FixedClock::new(at(15, 9)));

        let habit_id = {
            let server = HabitTrackerServer::with_clock(db_path.clone(), clock.clone())
                .await
                .expect("Failed to create first server");
            let habit_id = server.lifecycle().create("Morning Run", "daily").unwrap().id.unwrap();
            server.lifecycle().complete(&habit_id).unwrap();
            habit_id
        };

        clock.set(at(16, 9));
        let server = HabitTrackerServer::with_clock(db_path, clock.clone())
            .await
            .expect("Failed to create second server");

        let habit = server.lifecycle().get(&habit_id).unwrap();
        assert_eq!(habit.name, "Morning Run");
        assert_eq!(habit.current_streak, 1);

        let result = server.lifecycle().complete(&habit_id).unwrap();
        assert!(matches!(result, CompletionResult::Completed { current_streak: 2, .. }));
        assert_eq!(server.lifecycle().history(&habit_id).unwrap().len(), 3);
    }

    #[test]
    fn test_server_constructor_under_block_on() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = tokio_test::block_on(HabitTrackerServer::new(temp_file.path().to_path_buf()));
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_unopenable_database_is_reported() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        // a directory is not a database file
        let result = HabitTrackerServer::new(dir.path().to_path_buf()).await;
        assert!(matches!(result, Err(ServerError::Database(_))));
    }
}
