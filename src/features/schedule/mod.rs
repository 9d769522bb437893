//! # Feature: Calendar Events
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod store;

pub use store::{Event, EventDetails, EventStore};
