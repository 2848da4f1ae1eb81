//! OpenAI provider using async-openai

use super::errors::LLMError;
use super::traits::LLMProvider;
use super::types::*;
use crate::config::LlmSettings;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
        FinishReason as OpenAIFinishReason,
    },
};
use async_trait::async_trait;
use tracing::{debug, warn};

const PROVIDER_NAME: &str = "openai";

/// Chat-completion client for OpenAI and OpenAI-compatible endpoints
pub struct AsyncOpenAIProvider {
    client: Option<Client<OpenAIConfig>>,
    settings: LlmSettings,
}

impl AsyncOpenAIProvider {
    /// Create a provider from settings.
    ///
    /// A missing or malformed API key does not fail here; every request made
    /// through the provider fails with a configuration error instead.
    pub fn new(settings: LlmSettings) -> Self {
        let client = match settings.credential() {
            Ok(api_key) => {
                let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
                if let Some(base) = &settings.api_base {
                    openai_config = openai_config.with_api_base(base);
                }
                Some(Client::with_config(openai_config))
            }
            Err(e) => {
                debug!("OpenAI client not created: {}", e);
                None
            }
        };

        Self { client, settings }
    }

    fn client(&self) -> Result<&Client<OpenAIConfig>, LLMError> {
        match &self.client {
            Some(client) => Ok(client),
            None => match self.settings.credential() {
                Err(e) => Err(e.into()),
                Ok(_) => Err(LLMError::config("OpenAI client was not initialised")),
            },
        }
    }

    /// Convert internal messages to OpenAI format
    fn convert_messages(
        messages: Vec<Message>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, LLMError> {
        messages
            .into_iter()
            .map(|msg| {
                let converted: ChatCompletionRequestMessage = match msg.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(msg.content)
                        .build()
                        .map_err(map_openai_error)?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.content)
                        .build()
                        .map_err(map_openai_error)?
                        .into(),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(msg.content)
                        .build()
                        .map_err(map_openai_error)?
                        .into(),
                };
                Ok(converted)
            })
            .collect()
    }
}

#[async_trait]
impl LLMProvider for AsyncOpenAIProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, LLMError> {
        // Credential problems must surface before anything touches the network.
        let client = self.client()?;

        if messages.is_empty() {
            return Err(LLMError::invalid_request("no messages to send"));
        }

        let model = options.model.unwrap_or_else(|| self.settings.model.clone());
        let request = CreateChatCompletionRequestArgs::default()
            .model(&model)
            .messages(Self::convert_messages(messages)?)
            .temperature(options.temperature.unwrap_or(self.settings.temperature))
            .max_tokens(options.max_tokens.unwrap_or(self.settings.max_tokens))
            .build()
            .map_err(map_openai_error)?;

        debug!("Sending chat completion request to model {}", model);

        let timeout = self.settings.request_timeout();
        let response = tokio::time::timeout(timeout, client.chat().create(request))
            .await
            .map_err(|_| LLMError::timeout(timeout))?
            .map_err(map_openai_error)?;

        let choices = response
            .choices
            .into_iter()
            .map(|choice| Choice {
                index: choice.index as usize,
                message: Message::assistant(choice.message.content.unwrap_or_default()),
                finish_reason: choice.finish_reason.map(convert_finish_reason),
            })
            .collect::<Vec<_>>();

        if choices.is_empty() {
            return Err(LLMError::parse("No choices in OpenAI response"));
        }

        if choices[0].finish_reason == Some(FinishReason::Length) {
            warn!("Completion was cut off by the max_tokens limit ({})", self.settings.max_tokens);
        }

        Ok(CompletionResponse {
            id: response.id,
            model: response.model,
            choices,
            usage: response.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens as usize,
                completion_tokens: u.completion_tokens as usize,
                total_tokens: u.total_tokens as usize,
            }),
            created: i64::from(response.created),
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LLMError> {
        let client = self.client()?;

        let model = request.model.unwrap_or_else(|| self.settings.embedding_model.clone());
        let openai_request = CreateEmbeddingRequestArgs::default()
            .model(&model)
            .input(request.input)
            .build()
            .map_err(map_openai_error)?;

        let timeout = self.settings.request_timeout();
        let response = tokio::time::timeout(timeout, client.embeddings().create(openai_request))
            .await
            .map_err(|_| LLMError::timeout(timeout))?
            .map_err(map_openai_error)?;

        Ok(EmbeddingResponse {
            data: response
                .data
                .into_iter()
                .map(|e| Embedding { index: e.index as usize, embedding: e.embedding })
                .collect(),
            model: response.model,
            usage: Usage {
                prompt_tokens: response.usage.prompt_tokens as usize,
                completion_tokens: 0,
                total_tokens: response.usage.total_tokens as usize,
            },
        })
    }
}

fn convert_finish_reason(reason: OpenAIFinishReason) -> FinishReason {
    match reason {
        OpenAIFinishReason::Stop => FinishReason::Stop,
        OpenAIFinishReason::Length => FinishReason::Length,
        OpenAIFinishReason::ToolCalls => FinishReason::ToolCalls,
        OpenAIFinishReason::ContentFilter => FinishReason::ContentFilter,
        OpenAIFinishReason::FunctionCall => FinishReason::FunctionCall,
    }
}

/// Map client errors onto the provider-neutral error type
fn map_openai_error(err: OpenAIError) -> LLMError {
    match err {
        OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
        OpenAIError::Reqwest(e) => LLMError::network(e.to_string()),
        OpenAIError::InvalidArgument(message) => LLMError::invalid_request(message),
        other => LLMError::provider(PROVIDER_NAME, other.to_string()),
    }
}

fn classify_api_error(kind: Option<&str>, message: &str) -> LLMError {
    let lower = message.to_lowercase();

    if lower.contains("api key") || lower.contains("unauthorized") || lower.contains("authentication")
    {
        LLMError::auth(message)
    } else if lower.contains("rate limit")
        || lower.contains("quota")
        || kind == Some("insufficient_quota")
        || kind == Some("rate_limit_exceeded")
    {
        LLMError::rate_limit(message)
    } else if kind == Some("invalid_request_error") {
        LLMError::invalid_request(message)
    } else {
        LLMError::api(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let provider = AsyncOpenAIProvider::new(LlmSettings::default());
        assert!(!provider.is_available().await);

        let err = provider
            .complete(vec![Message::user("write a function")], CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ConfigurationError { .. }));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_malformed_key_fails_before_request() {
        let settings =
            LlmSettings { api_key: Some("sk bad key".to_string()), ..Default::default() };
        let provider = AsyncOpenAIProvider::new(settings);

        let err = provider
            .embed(EmbeddingRequest { input: vec!["x".to_string()], model: None })
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ConfigurationError { .. }));
    }

    #[tokio::test]
    async fn test_valid_key_builds_client() {
        let settings = LlmSettings { api_key: Some("sk-test".to_string()), ..Default::default() };
        let provider = AsyncOpenAIProvider::new(settings);
        assert!(provider.is_available().await);
        assert_eq!(provider.model(), "gpt-4o-mini");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_convert_messages() {
        let converted = AsyncOpenAIProvider::convert_messages(vec![
            Message::system("You are an expert programmer."),
            Message::user("Write a sort function"),
            Message::assistant("def sort(xs): ..."),
        ])
        .unwrap();
        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(converted[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_classify_api_error() {
        assert!(matches!(
            classify_api_error(Some("invalid_request_error"), "Incorrect API key provided"),
            LLMError::AuthenticationError { .. }
        ));
        assert!(matches!(
            classify_api_error(Some("requests"), "Rate limit reached for gpt-4o"),
            LLMError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            classify_api_error(Some("invalid_request_error"), "max_tokens is too large"),
            LLMError::InvalidRequest { .. }
        ));
        assert!(matches!(classify_api_error(None, "server exploded"), LLMError::ApiError { .. }));
    }
}
