use async_trait::async_trait;

use super::error::LlmError;
use super::types::{ChatCompletion, ChatRequest};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// chat completion (non-streaming), optionally with callable tools
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatCompletion, LlmError>;

    /// generate one embedding per input, in input order
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, LlmError>;
}
