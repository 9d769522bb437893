//! # Core Module
//!
//! Configuration, error taxonomy and outbound delivery shared by every feature.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Console plus rotating log file
//! - 1.2.0: Add delivery sink abstraction and typed errors
//! - 1.1.0: Add response module with message chunking
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod response;

pub use config::Config;
pub use delivery::{DeliverySink, DirectMessageSink};
pub use error::{AssistantError, AssistantResult};
pub use response::{chunk_for_message, chunk_text, MESSAGE_LIMIT};
