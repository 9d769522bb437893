//! Outbound message delivery
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: DeliverySink trait with Discord DM implementation

use async_trait::async_trait;
use log::debug;
use serenity::http::Http;
use serenity::model::id::UserId;
use std::sync::Arc;

use super::error::{AssistantError, AssistantResult};
use super::response::chunk_for_message;

/// Anything that can push a text message to a single recipient
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, recipient: u64, text: &str) -> AssistantResult<()>;
}

/// Sends direct messages through the Discord REST API.
///
/// Text over [`MESSAGE_LIMIT`](super::response::MESSAGE_LIMIT) goes out as
/// several messages; if a later one fails the earlier ones stay sent.
#[derive(Clone)]
pub struct DirectMessageSink {
    http: Arc<Http>,
}

impl DirectMessageSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DeliverySink for DirectMessageSink {
    async fn deliver(&self, recipient: u64, text: &str) -> AssistantResult<()> {
        let http: &Http = &self.http;
        let dm = UserId(recipient)
            .create_dm_channel(http)
            .await
            .map_err(AssistantError::delivery_failed)?;

        for chunk in chunk_for_message(text) {
            dm.say(http, &chunk)
                .await
                .map_err(AssistantError::delivery_failed)?;
        }

        debug!("Delivered {} chars to user {}", text.len(), recipient);
        Ok(())
    }
}
