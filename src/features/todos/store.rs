//! Task persistence
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Typed Task rows with zone-aware instants
//! - 1.0.0: add, list, list_pending, complete, delete

use chrono::DateTime;
use chrono_tz::Tz;
use log::debug;
use sqlite::{State, Statement};

use crate::core::error::{AssistantError, AssistantResult};
use crate::database::{last_insert_id, Database};
use crate::features::time::{from_storage, now_in, to_storage};

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub due_date: Option<DateTime<Tz>>,
    pub completed: bool,
    pub created_at: DateTime<Tz>,
}

const TASK_COLUMNS: &str = "id, description, due_date, completed, created_at";

#[derive(Clone)]
pub struct TaskStore {
    database: Database,
    timezone: Tz,
}

impl TaskStore {
    pub fn new(database: Database, timezone: Tz) -> Self {
        Self { database, timezone }
    }

    /// Insert a new, incomplete task and return its id
    pub async fn add(&self, description: &str, due: Option<&DateTime<Tz>>) -> AssistantResult<i64> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AssistantError::Validation("task description is empty".into()));
        }
        let due = due.map(to_storage);
        let created_at = to_storage(&now_in(self.timezone));

        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(
                    "INSERT INTO tasks(description, due_date, created_at) VALUES (?, ?, ?)",
                )?;
                statement.bind((1, description))?;
                statement.bind((2, due.as_deref()))?;
                statement.bind((3, created_at.as_str()))?;
                statement.next()?;
                last_insert_id(conn)
            })
            .await
    }

    /// Every task, by id
    pub async fn list(&self) -> AssistantResult<Vec<Task>> {
        self.query(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))
            .await
    }

    /// Incomplete tasks, by id
    pub async fn list_pending(&self) -> AssistantResult<Vec<Task>> {
        self.query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE completed = 0 ORDER BY id"
        ))
        .await
    }

    /// Mark a task done; returns the number of rows touched (0 for an unknown id)
    pub async fn complete(&self, id: i64) -> AssistantResult<usize> {
        let changed = self
            .execute_by_id("UPDATE tasks SET completed = 1 WHERE id = ?", id)
            .await?;
        debug!("complete task #{id}: {changed} row(s)");
        Ok(changed)
    }

    /// Remove a task permanently; returns the number of rows touched
    pub async fn delete(&self, id: i64) -> AssistantResult<usize> {
        let changed = self
            .execute_by_id("DELETE FROM tasks WHERE id = ?", id)
            .await?;
        debug!("delete task #{id}: {changed} row(s)");
        Ok(changed)
    }

    async fn execute_by_id(&self, sql: &str, id: i64) -> AssistantResult<usize> {
        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(sql)?;
                statement.bind((1, id))?;
                statement.next()?;
                Ok(conn.change_count())
            })
            .await
    }

    async fn query(&self, sql: &str) -> AssistantResult<Vec<Task>> {
        let tz = self.timezone;
        self.database
            .with_connection(|conn| {
                let mut statement = conn.prepare(sql)?;
                let mut tasks = Vec::new();
                while let State::Row = statement.next()? {
                    tasks.push(read_task(&statement, tz)?);
                }
                Ok(tasks)
            })
            .await
    }
}

fn read_task(statement: &Statement<'_>, tz: Tz) -> AssistantResult<Task> {
    let due_date = statement
        .read::<Option<String>, _>("due_date")?
        .map(|value| from_storage(&value, tz))
        .transpose()?;

    Ok(Task {
        id: statement.read::<i64, _>("id")?,
        description: statement.read::<String, _>("description")?,
        due_date,
        completed: statement.read::<i64, _>("completed")? != 0,
        created_at: from_storage(&statement.read::<String, _>("created_at")?, tz)?,
    })
}
