//! # Features Layer
//!
//! One module per feature. Each exposes its public types at the module root.

pub mod chat;
pub mod intents;
pub mod reminders;
pub mod schedule;
pub mod time;
pub mod todos;

pub use chat::{ChatFallback, OpenAiChat};
pub use intents::{Command, CommandParser, Intent, IntentClassifier, TodoCommand};
pub use reminders::{CycleReport, DueReminder, Reminder, ReminderScheduler, ReminderStore};
pub use schedule::{Event, EventDetails, EventStore};
pub use todos::{Task, TaskStore};
