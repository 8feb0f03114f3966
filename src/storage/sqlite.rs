/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habits and tasks. It handles all SQL queries and the
/// conversion between rows and domain types.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Habit, HabitId, Periodicity, Task, TaskId};
use crate::storage::{migrations, HabitFilter, HabitStorage, StorageError};

const HABIT_COLUMNS: &str = "id, name, periodicity, current_streak, longest_streak, \
     next_completion_date, created_at, updated_at";

const TASK_COLUMNS: &str = "id, habit_id, completed, completed_on, expected_completion_by, \
     created_at, updated_at";

/// Savepoint wrapping `atomically`; savepoints nest, plain transactions don't
const SAVEPOINT: &str = "habit_tracker_atomic";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// all the storage operations defined in the HabitStorage trait. Timestamps
/// are written exactly as the caller stamped them.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// A private in-memory database, gone when dropped
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        // Needed for ON DELETE CASCADE from habits to tasks
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<HabitRow> {
        Ok(HabitRow {
            id: row.get(0)?,
            name: row.get(1)?,
            periodicity: row.get(2)?,
            current_streak: row.get(3)?,
            longest_streak: row.get(4)?,
            next_completion_date: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
        Ok(TaskRow {
            id: row.get(0)?,
            habit_id: row.get(1)?,
            completed: row.get(2)?,
            completed_on: row.get(3)?,
            expected_completion_by: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn insert_habit(&self, habit: &Habit, id: &HabitId) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO habits (
                id, name, periodicity, current_streak, longest_streak,
                next_completion_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                habit.name,
                habit.periodicity.as_str(),
                habit.current_streak,
                habit.longest_streak,
                habit.next_completion_date,
                habit.created_at,
                habit.updated_at,
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.name, id);
        Ok(())
    }

    fn update_habit(&self, habit: &Habit, id: &HabitId) -> Result<(), StorageError> {
        // periodicity and created_at are never rewritten
        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                name = ?2,
                current_streak = ?3,
                longest_streak = ?4,
                next_completion_date = ?5,
                updated_at = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                habit.name,
                habit.current_streak,
                habit.longest_streak,
                habit.next_completion_date,
                habit.updated_at,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: id.to_string() });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, id);
        Ok(())
    }

    fn insert_task(&self, task: &Task, id: &TaskId) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO tasks (
                id, habit_id, completed, completed_on, expected_completion_by,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                task.habit_id.to_string(),
                task.completed,
                task.completed_on,
                task.expected_completion_by,
                task.created_at,
                task.updated_at,
            ],
        )?;

        tracing::debug!(
            "Created task {} for habit {} due {}",
            id,
            task.habit_id,
            task.expected_completion_by
        );
        Ok(())
    }

    fn update_task(&self, task: &Task, id: &TaskId) -> Result<(), StorageError> {
        // expected_completion_by and habit_id are fixed at creation
        let rows_affected = self.conn.execute(
            "UPDATE tasks SET
                completed = ?2,
                completed_on = ?3,
                updated_at = ?4
             WHERE id = ?1",
            params![id.to_string(), task.completed, task.completed_on, task.updated_at],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::TaskNotFound { task_id: id.to_string() });
        }

        tracing::debug!("Updated task {} (completed: {})", id, task.completed);
        Ok(())
    }
}

impl HabitStorage for SqliteStorage {
    fn load_habit(&self, habit_id: &HabitId) -> Result<Option<Habit>, StorageError> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![habit_id.to_string()], Self::habit_from_row)
            .optional()?;

        row.map(Habit::try_from).transpose()
    }

    fn load_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>, StorageError> {
        let sql = format!(
            "SELECT {} FROM habits
             WHERE (?1 IS NULL OR name = ?1)
               AND (?2 IS NULL OR periodicity = ?2)
             ORDER BY created_at ASC, rowid ASC",
            HABIT_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![filter.name, filter.periodicity.map(|p| p.as_str())],
            Self::habit_from_row,
        )?;

        let mut habits = Vec::new();
        for row in rows {
            habits.push(Habit::try_from(row?)?);
        }

        Ok(habits)
    }

    fn save_habit(&self, habit: &Habit) -> Result<Habit, StorageError> {
        let mut stored = habit.clone();

        match &habit.id {
            Some(id) => self.update_habit(&stored, id)?,
            None => {
                let id = HabitId::new();
                self.insert_habit(&stored, &id)?;
                stored.id = Some(id);
            }
        }

        Ok(stored)
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![habit_id.to_string()])?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: habit_id.to_string() });
        }

        tracing::debug!("Deleted habit {} and its tasks", habit_id);
        Ok(())
    }

    fn delete_all_habits(&self) -> Result<usize, StorageError> {
        let deleted = self.conn.execute("DELETE FROM habits", [])?;
        tracing::debug!("Deleted all {} habits", deleted);
        Ok(deleted)
    }

    fn load_outstanding_task(&self, habit_id: &HabitId) -> Result<Option<Task>, StorageError> {
        let sql = format!(
            "SELECT {} FROM tasks
             WHERE habit_id = ?1 AND completed = 0
             ORDER BY created_at DESC, rowid DESC",
            TASK_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![habit_id.to_string()], Self::task_from_row)?;

        let mut outstanding = Vec::new();
        for row in rows {
            outstanding.push(Task::try_from(row?)?);
        }

        if outstanding.len() > 1 {
            tracing::error!("Habit {} has {} outstanding tasks", habit_id, outstanding.len());
            return Err(StorageError::MultipleOutstandingTasks {
                habit_id: habit_id.to_string(),
                count: outstanding.len(),
            });
        }

        Ok(outstanding.pop())
    }

    fn load_task(&self, task_id: &TaskId) -> Result<Option<Task>, StorageError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![task_id.to_string()], Self::task_from_row)
            .optional()?;

        row.map(Task::try_from).transpose()
    }

    fn load_tasks(&self, habit_id: &HabitId) -> Result<Vec<Task>, StorageError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE habit_id = ?1 ORDER BY created_at ASC, rowid ASC",
            TASK_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![habit_id.to_string()], Self::task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(Task::try_from(row?)?);
        }

        Ok(tasks)
    }

    fn save_task(&self, task: &Task) -> Result<Task, StorageError> {
        let mut stored = task.clone();

        match &task.id {
            Some(id) => self.update_task(&stored, id)?,
            None => {
                let id = TaskId::new();
                self.insert_task(&stored, &id)?;
                stored.id = Some(id);
            }
        }

        Ok(stored)
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>,
    {
        self.conn
            .execute_batch(&format!("SAVEPOINT {}", SAVEPOINT))
            .map_err(StorageError::from)?;

        let result = f(self);
        let finish = match &result {
            Ok(_) => self.conn.execute_batch(&format!("RELEASE SAVEPOINT {}", SAVEPOINT)),
            Err(_) => self.rollback(),
        };

        match (result, finish) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(commit_err)) => {
                if let Err(e) = self.rollback() {
                    tracing::error!("Rollback after failed commit also failed: {}", e);
                }
                Err(StorageError::from(commit_err).into())
            }
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(rollback_err)) => {
                tracing::error!("Failed to roll back: {}", rollback_err);
                Err(err)
            }
        }
    }
}

impl SqliteStorage {
    fn rollback(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {0}; RELEASE SAVEPOINT {0}",
            SAVEPOINT
        ))
    }
}

/// Raw habit columns, converted to a `Habit` outside the row callback so that
/// bad values surface as `StorageError::CorruptRecord`
struct HabitRow {
    id: String,
    name: String,
    periodicity: String,
    current_streak: u32,
    longest_streak: u32,
    next_completion_date: NaiveDateTime,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<HabitRow> for Habit {
    type Error = StorageError;

    fn try_from(row: HabitRow) -> Result<Self, Self::Error> {
        let id = parse_habit_id("habits.id", &row.id)?;
        let periodicity: Periodicity = row.periodicity.parse().map_err(|_| StorageError::CorruptRecord {
            column: "habits.periodicity",
            value: row.periodicity.clone(),
        })?;

        Ok(Habit {
            id: Some(id),
            name: row.name,
            periodicity,
            current_streak: row.current_streak,
            longest_streak: row.longest_streak,
            next_completion_date: row.next_completion_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct TaskRow {
    id: String,
    habit_id: String,
    completed: bool,
    completed_on: Option<NaiveDateTime>,
    expected_completion_by: NaiveDateTime,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = StorageError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let id = TaskId::from_string(&row.id).map_err(|_| StorageError::CorruptRecord {
            column: "tasks.id",
            value: row.id.clone(),
        })?;
        let habit_id = parse_habit_id("tasks.habit_id", &row.habit_id)?;

        Ok(Task {
            id: Some(id),
            habit_id,
            completed: row.completed,
            completed_on: row.completed_on,
            expected_completion_by: row.expected_completion_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_habit_id(column: &'static str, value: &str) -> Result<HabitId, StorageError> {
    HabitId::from_string(value).map_err(|_| StorageError::CorruptRecord {
        column,
        value: value.to_string(),
    })
}
