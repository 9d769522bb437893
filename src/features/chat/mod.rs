//! # Feature: Conversational Fallback
//!
//! Free-form replies for messages that match no command or intent.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Client built once at startup and injected, 45s timeout
//! - 1.0.0: Single-turn ChatGPT replies

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::core::config::OpenAiSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

#[async_trait]
pub trait ChatFallback: Send + Sync {
    async fn reply(&self, prompt: &str) -> Result<String>;
}

/// Single-turn ChatGPT client
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(settings: &OpenAiSettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl ChatFallback for OpenAiChat {
    async fn reply(&self, prompt: &str) -> Result<String> {
        let start_time = Instant::now();
        let messages = vec![ChatCompletionMessage {
            role: ChatCompletionMessageRole::User,
            content: Some(prompt.to_string()),
            name: None,
            function_call: None,
            tool_call_id: None,
            tool_calls: None,
        }];

        let request = ChatCompletion::builder(&self.model, messages)
            .temperature(self.temperature)
            .create();

        let chat_completion = timeout(REQUEST_TIMEOUT, request)
            .await
            .map_err(|_| {
                error!("OpenAI request timed out after {:?}", start_time.elapsed());
                anyhow::anyhow!("OpenAI API request timed out after 45 seconds")
            })?
            .map_err(|e| anyhow::anyhow!("OpenAI API error: {}", e))?;

        debug!("OpenAI response after {:?}", start_time.elapsed());

        chat_completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No content in OpenAI response"))
    }
}
