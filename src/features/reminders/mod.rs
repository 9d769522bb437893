//! # Feature: Reminders
//!
//! Reminder storage and the background loop that delivers due reminders to
//! the owner by direct message.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod scheduler;
pub mod store;

pub use scheduler::{CycleReport, ReminderScheduler};
pub use store::{DueReminder, Reminder, ReminderStore};
