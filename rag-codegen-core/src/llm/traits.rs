//! Traits for LLM provider implementations
//!
//! This module defines the core trait that all LLM providers implement,
//! so the RAG manager can be driven by the OpenAI client or a test double.

use super::types::*;
use crate::llm::errors::LLMError;
use async_trait::async_trait;

/// Core trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Get the model ID being used
    fn model(&self) -> &str;

    /// Check if the provider is configured well enough to send requests
    async fn is_available(&self) -> bool;

    /// Complete a chat conversation
    async fn complete(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, LLMError>;

    /// Generate embeddings for text
    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, LLMError> {
        Err(LLMError::not_supported("embeddings", self.name()))
    }
}
