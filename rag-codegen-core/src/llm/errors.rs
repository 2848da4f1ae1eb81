//! Error types for LLM operations
//!
//! This module defines strongly-typed errors for all LLM operations,
//! using thiserror for automatic error trait implementations.

use crate::config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Main error type for LLM operations
#[derive(Debug, Error)]
pub enum LLMError {
    /// API key was rejected by the endpoint
    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    /// Rate limit or quota has been exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    /// Request timed out
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Network error occurred
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// API returned an error
    #[error("API error: {message}")]
    ApiError { message: String },

    /// Invalid request parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Feature not supported by provider
    #[error("Feature '{feature}' is not supported by provider '{provider}'")]
    NotSupported { feature: String, provider: String },

    /// Configuration error, raised before any request is sent
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Malformed or empty response
    #[error("Parsing error: {message}")]
    ParseError { message: String },

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    ProviderError { provider: String, message: String },
}

impl LLMError {
    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthenticationError { message: message.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimitExceeded { message: message.into() }
    }

    /// Create a timeout error
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    /// Create an API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::ApiError { message: message.into() }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Create a not supported error
    pub fn not_supported(feature: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::NotSupported { feature: feature.into(), provider: provider.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError { message: message.into() }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderError { provider: provider.into(), message: message.into() }
    }

    /// True when the user has to fix configuration before retrying
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationError { .. } | Self::AuthenticationError { .. })
    }
}

/// Result type for LLM operations
pub type LLMResult<T> = Result<T, LLMError>;

impl From<ConfigError> for LLMError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigurationError { message: err.to_string() }
    }
}

/// Convert from JSON errors
impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LLMError::auth("Invalid API key");
        assert_eq!(err.to_string(), "Authentication failed: Invalid API key");

        let err = LLMError::rate_limit("Too many requests");
        assert!(err.to_string().contains("Rate limit exceeded"));

        let err = LLMError::not_supported("embeddings", "mock");
        assert_eq!(err.to_string(), "Feature 'embeddings' is not supported by provider 'mock'");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(LLMError::config("missing key").is_configuration());
        assert!(LLMError::auth("bad key").is_configuration());
        assert!(!LLMError::network("connection reset").is_configuration());
        assert!(!LLMError::timeout(Duration::from_secs(1)).is_configuration());
    }

    #[test]
    fn test_error_conversion() {
        let llm_err: LLMError = ConfigError::MissingCredential.into();
        assert!(matches!(llm_err, LLMError::ConfigurationError { .. }));
        assert!(llm_err.to_string().contains("OPENAI_API_KEY"));

        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LLMError = json_err.into();
        assert!(matches!(llm_err, LLMError::ParseError { .. }));
    }
}
