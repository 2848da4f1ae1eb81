//! Mock LLM provider for testing
//!
//! This module provides a mock implementation of the LLMProvider trait
//! for use in unit tests only. It is not available in production builds.

#![cfg(test)]

use super::errors::LLMError;
use super::traits::LLMProvider;
use super::types::*;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock LLM provider for testing
#[derive(Clone)]
pub struct MockLLMProvider {
    name: String,
    model: String,
    responses: Arc<Mutex<VecDeque<Result<CompletionResponse, LLMError>>>>,
    call_history: Arc<Mutex<Vec<(Vec<Message>, CompletionOptions)>>>,
}

impl MockLLMProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            model: "mock-model".to_string(),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a text response
    pub fn push_text(&self, content: &str) {
        self.responses.lock().unwrap().push_back(Ok(Self::simple_response(content)));
    }

    /// Queue an error
    pub fn push_error(&self, error: LLMError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Number of completion calls received so far
    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    /// Messages of the most recent call
    pub fn last_messages(&self) -> Option<Vec<Message>> {
        self.call_history.lock().unwrap().last().map(|(messages, _)| messages.clone())
    }

    /// Create a simple text response
    pub fn simple_response(content: &str) -> CompletionResponse {
        CompletionResponse {
            id: "mock-response-1".to_string(),
            model: "mock-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: Some(Usage { prompt_tokens: 10, completion_tokens: 20, total_tokens: 30 }),
            created: 1234567890,
        }
    }
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, LLMError> {
        self.call_history.lock().unwrap().push((messages, options));

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::simple_response("Mock response")))
    }
}
