//! Generation client
//!
//! Provider abstraction over hosted chat-completion endpoints, the OpenAI
//! implementation built on `async-openai`, and the prompt templates used for
//! retrieval-augmented generation and review.

pub mod errors;
pub mod mock;
pub mod openai_async;
pub mod prompts;
pub mod traits;
pub mod types;

pub use errors::{LLMError, LLMResult};
pub use openai_async::AsyncOpenAIProvider;
pub use traits::LLMProvider;
pub use types::{CompletionOptions, CompletionResponse, Message, Role};
