//! Reminder persistence
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Messages limited to one chat message
//! - 1.1.0: `due` ordered by remind_at
//! - 1.0.0: add, list_pending, due, mark_sent

use chrono::DateTime;
use chrono_tz::Tz;
use sqlite::State;

use crate::core::error::{AssistantError, AssistantResult};
use crate::core::response::MESSAGE_LIMIT;
use crate::database::{last_insert_id, Database};
use crate::features::time::{from_storage, to_storage};

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: i64,
    pub message: String,
    pub remind_at: DateTime<Tz>,
}

/// A reminder ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub id: i64,
    pub message: String,
}

#[derive(Clone)]
pub struct ReminderStore {
    database: Database,
    timezone: Tz,
}

impl ReminderStore {
    pub fn new(database: Database, timezone: Tz) -> Self {
        Self { database, timezone }
    }

    pub async fn add(&self, message: &str, remind_at: &DateTime<Tz>) -> AssistantResult<i64> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AssistantError::Validation("reminder message is empty".into()));
        }
        // Delivered as a single message, so a retry never repeats a partial send
        if message.len() > MESSAGE_LIMIT {
            return Err(AssistantError::Validation(format!(
                "reminder message exceeds {MESSAGE_LIMIT} bytes"
            )));
        }
        let remind_at = to_storage(remind_at);

        self.database
            .with_connection(|conn| {
                let mut statement =
                    conn.prepare("INSERT INTO reminders(message, remind_at) VALUES (?, ?)")?;
                statement.bind((1, message))?;
                statement.bind((2, remind_at.as_str()))?;
                statement.next()?;
                last_insert_id(conn)
            })
            .await
    }

    /// Unsent reminders, soonest first
    pub async fn list_pending(&self) -> AssistantResult<Vec<Reminder>> {
        let tz = self.timezone;
        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(
                    "SELECT id, message, remind_at FROM reminders WHERE sent = 0 ORDER BY remind_at, id",
                )?;
                let mut reminders = Vec::new();
                while let State::Row = statement.next()? {
                    reminders.push(Reminder {
                        id: statement.read::<i64, _>("id")?,
                        message: statement.read::<String, _>("message")?,
                        remind_at: from_storage(&statement.read::<String, _>("remind_at")?, tz)?,
                    });
                }
                Ok(reminders)
            })
            .await
    }

    /// Unsent reminders with remind_at <= now, soonest first
    pub async fn due(&self, now: &DateTime<Tz>) -> AssistantResult<Vec<DueReminder>> {
        let now = to_storage(now);
        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(
                    "SELECT id, message FROM reminders WHERE sent = 0 AND remind_at <= ? ORDER BY remind_at, id",
                )?;
                statement.bind((1, now.as_str()))?;
                let mut due = Vec::new();
                while let State::Row = statement.next()? {
                    due.push(DueReminder {
                        id: statement.read::<i64, _>("id")?,
                        message: statement.read::<String, _>("message")?,
                    });
                }
                Ok(due)
            })
            .await
    }

    /// Flag a reminder as delivered. Repeating the call is harmless.
    pub async fn mark_sent(&self, id: i64) -> AssistantResult<()> {
        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare("UPDATE reminders SET sent = 1 WHERE id = ?")?;
                statement.bind((1, id))?;
                statement.next()?;
                Ok(())
            })
            .await
    }
}
