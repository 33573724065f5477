//! Mock provider implementation for local runs and tests.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use crate::models::{ModelPart, Prompt};
use async_trait::async_trait;
use std::sync::Mutex;

/// Mock text provider: records every prompt and answers from memory.
#[derive(Default)]
pub struct MockTextProvider {
    reply: Option<String>,
    failure: Option<ProviderError>,
    calls: Mutex<Vec<Prompt>>,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Always fail with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Prompts received so far, oldest first.
    pub fn calls(&self) -> Vec<Prompt> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.clone());
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let text = self.reply.clone().unwrap_or_else(|| {
            let last_text = prompt
                .parts()
                .iter()
                .rev()
                .find_map(|part| match part {
                    ModelPart::Text(text) => Some(text.as_str()),
                    ModelPart::InlineData { .. } => None,
                })
                .unwrap_or_default();
            format!("Mock response for: {}", last_text)
        });

        Ok(ProviderResponse {
            output_tokens: text.len() as i32 / 4,
            text,
            input_tokens: prompt.text_len() as i32 / 4,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
