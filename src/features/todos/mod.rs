//! # Feature: Todo List
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod store;

pub use store::{Task, TaskStore};
