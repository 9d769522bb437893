//! Calendar event persistence
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use chrono::DateTime;
use chrono_tz::Tz;
use sqlite::{State, Statement};

use crate::core::error::{AssistantError, AssistantResult};
use crate::database::{last_insert_id, Database};
use crate::features::time::{from_storage, to_storage};

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Tz>,
    pub end_time: Option<DateTime<Tz>>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Optional fields of a new event
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
    pub end_time: Option<DateTime<Tz>>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct EventStore {
    database: Database,
    timezone: Tz,
}

impl EventStore {
    pub fn new(database: Database, timezone: Tz) -> Self {
        Self { database, timezone }
    }

    pub async fn add(
        &self,
        title: &str,
        start_time: &DateTime<Tz>,
        details: EventDetails,
    ) -> AssistantResult<i64> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AssistantError::Validation("event title is empty".into()));
        }
        if let Some(end) = &details.end_time {
            if end < start_time {
                return Err(AssistantError::Validation(format!(
                    "event ends ({end}) before it starts ({start_time})"
                )));
            }
        }

        let start = to_storage(start_time);
        let end = details.end_time.as_ref().map(to_storage);

        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(
                    "INSERT INTO events(title, start_time, end_time, location, notes) VALUES (?, ?, ?, ?, ?)",
                )?;
                statement.bind((1, title))?;
                statement.bind((2, start.as_str()))?;
                statement.bind((3, end.as_deref()))?;
                statement.bind((4, details.location.as_deref()))?;
                statement.bind((5, details.notes.as_deref()))?;
                statement.next()?;
                last_insert_id(conn)
            })
            .await
    }

    /// All events, earliest start first
    pub async fn list(&self) -> AssistantResult<Vec<Event>> {
        let tz = self.timezone;
        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(
                    "SELECT id, title, start_time, end_time, location, notes FROM events ORDER BY start_time, id",
                )?;
                let mut events = Vec::new();
                while let State::Row = statement.next()? {
                    events.push(read_event(&statement, tz)?);
                }
                Ok(events)
            })
            .await
    }
}

fn read_event(statement: &Statement<'_>, tz: Tz) -> AssistantResult<Event> {
    let end_time = statement
        .read::<Option<String>, _>("end_time")?
        .map(|value| from_storage(&value, tz))
        .transpose()?;

    Ok(Event {
        id: statement.read::<i64, _>("id")?,
        title: statement.read::<String, _>("title")?,
        start_time: from_storage(&statement.read::<String, _>("start_time")?, tz)?,
        end_time,
        location: statement.read::<Option<String>, _>("location")?,
        notes: statement.read::<Option<String>, _>("notes")?,
    })
}
