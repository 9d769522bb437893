//! # Feature: Intent Recognition
//!
//! Structured commands first, then an ordered cascade of natural-language
//! matchers (English and Japanese) producing a typed [`Intent`].
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod classifier;
pub mod command;

pub use classifier::{Intent, IntentClassifier};
pub use command::{Command, CommandParser, TodoCommand};
