//! SQLite connection handle and schema bootstrap
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Instants stored as UTC RFC 3339 text, reminders index
//! - 1.0.0: tasks, events and reminders tables

use log::info;
use sqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::error::AssistantResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL,
    due_date TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT,
    location TEXT,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message TEXT NOT NULL,
    remind_at TEXT NOT NULL,
    sent INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(sent, remind_at);
";

/// Shared handle to the bot's SQLite database.
///
/// All access goes through one connection behind a mutex, so statements from
/// the message handler and the reminder scheduler never interleave.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub async fn new(path: &str) -> AssistantResult<Self> {
        let connection = sqlite::open(path)?;
        let database = Self::bootstrap(connection)?;
        info!("📂 Database ready at {path}");
        Ok(database)
    }

    pub async fn in_memory() -> AssistantResult<Self> {
        Self::bootstrap(sqlite::open(":memory:")?)
    }

    fn bootstrap(connection: Connection) -> AssistantResult<Self> {
        connection.execute(SCHEMA)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Run `f` with exclusive access to the connection
    pub async fn with_connection<T, F>(&self, f: F) -> AssistantResult<T>
    where
        F: FnOnce(&Connection) -> AssistantResult<T>,
    {
        let connection = self.connection.lock().await;
        f(&connection)
    }

    /// Raw batch execution, used by tests and maintenance
    pub async fn execute_batch(&self, sql: &str) -> AssistantResult<()> {
        self.with_connection(|conn| Ok(conn.execute(sql)?)).await
    }
}

/// Id of the row inserted by the previous statement on `conn`
pub(crate) fn last_insert_id(conn: &Connection) -> AssistantResult<i64> {
    let mut statement = conn.prepare("SELECT last_insert_rowid() AS id")?;
    statement.next()?;
    Ok(statement.read::<i64, _>("id")?)
}
