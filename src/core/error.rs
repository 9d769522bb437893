//! Error taxonomy shared by the store adapters, time resolver and delivery sinks
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial taxonomy (malformed time, store, delivery)

use thiserror::Error;

pub type AssistantResult<T> = Result<T, AssistantError>;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// A time expression matched syntactically but names no real instant
    #[error("malformed time: {0}")]
    MalformedTime(String),

    /// The persistence layer could not run the statement
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlite::Error),

    /// A stored value could not be parsed back into its typed form
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The delivery sink rejected a message
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

impl AssistantError {
    pub fn malformed_time(detail: impl Into<String>) -> Self {
        Self::MalformedTime(detail.into())
    }

    pub fn delivery_failed(detail: impl std::fmt::Display) -> Self {
        Self::DeliveryFailed(detail.to_string())
    }
}
