pub mod error;
pub mod openai;
pub mod provider;
pub mod retry;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use error::LlmError;
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use retry::{RetryPolicy, RetryingProvider};
pub use types::{ChatCompletion, ChatMessage, ChatRequest, ToolCall, ToolSpec};
