/// Public library interface for the Habit Tracker
///
/// Habits are recurring daily or weekly commitments. Each habit always has
/// one outstanding task with an end-of-day due date; completing it on time
/// grows the habit's streak, completing it late resets the streak. This
/// crate exposes the domain rules, the SQLite storage, the lifecycle that
/// ties them together and an MCP server over stdio.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

// Internal modules
mod analytics;
mod domain;
mod lifecycle;
mod mcp;
mod storage;
mod tools;

// Re-export public modules and types
pub use analytics::{AnalyticsEngine, StreakLeader};
pub use domain::*;
pub use lifecycle::{CompletionResult, HabitLifecycle, LifecycleError};
pub use mcp::{JsonRpcResponse, McpServer};
pub use storage::{HabitFilter, HabitStorage, SqliteStorage, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("Habit operation failed: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lifecycle wired to SQLite and a shared clock
pub type ServerLifecycle = HabitLifecycle<SqliteStorage, Arc<dyn Clock>>;

/// Main habit tracker server that implements the MCP protocol
///
/// This server manages habit data through a SQLite database. Only the
/// lifecycle reads the clock, so `updated_at` stamps agree with the
/// instants used for due date decisions.
pub struct HabitTrackerServer {
    lifecycle: ServerLifecycle,
    analytics: AnalyticsEngine,
}

impl HabitTrackerServer {
    /// Create a new habit tracker server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub async fn new(db_path: PathBuf) -> Result<Self, ServerError> {
        Self::with_clock(db_path, Arc::new(SystemClock)).await
    }

    /// Create a server that reads time from the given clock
    pub async fn with_clock(db_path: PathBuf, clock: Arc<dyn Clock>) -> Result<Self, ServerError> {
        tracing::info!("Initializing Habit Tracker server with database: {:?}", db_path);

        let storage = SqliteStorage::new(&db_path)?;

        Ok(Self {
            lifecycle: HabitLifecycle::new(storage, clock),
            analytics: AnalyticsEngine::new(),
        })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        let habits = self.lifecycle.list(&HabitFilter::default())?;
        tracing::info!("Server started successfully, found {} existing habits", habits.len());

        let mut mcp_server = McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// The habit lifecycle backing every tool
    pub fn lifecycle(&self) -> &ServerLifecycle {
        &self.lifecycle
    }

    /// Get a reference to the analytics engine
    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }
}
