//! Scripted provider for tests: chat replies are queued up front and
//! embeddings are letter-frequency vectors, so similarity is predictable.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::error::LlmError;
use super::provider::LlmProvider;
use super::types::{ChatCompletion, ChatRequest};

#[derive(Default)]
pub struct ScriptedProvider {
    chat_script: Mutex<VecDeque<Result<ChatCompletion, LlmError>>>,
    embed_errors: Mutex<VecDeque<LlmError>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    chat_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    embedded_inputs: AtomicUsize,
    chat_delay: Option<Duration>,
    embed_delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_delay(mut self, delay: Duration) -> Self {
        self.chat_delay = Some(delay);
        self
    }

    pub fn with_embed_delay(mut self, delay: Duration) -> Self {
        self.embed_delay = Some(delay);
        self
    }

    pub fn push_chat(&self, completion: ChatCompletion) {
        self.chat_script.lock().unwrap().push_back(Ok(completion));
    }

    pub fn push_chat_text(&self, text: &str) {
        self.push_chat(ChatCompletion::text(text));
    }

    pub fn push_chat_error(&self, err: LlmError) {
        self.chat_script.lock().unwrap().push_back(Err(err));
    }

    pub fn push_embed_error(&self, err: LlmError) {
        self.embed_errors.lock().unwrap().push_back(err);
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn embedded_inputs(&self) -> usize {
        self.embedded_inputs.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.chat_calls() + self.embed_calls()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }
}

/// 26 letter counts plus a constant component so no vector has zero norm.
pub fn letter_histogram(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 27];
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() {
            vector[(ch as u8 - b'a') as usize] += 1.0;
        }
    }
    vector[26] = 0.5;
    vector
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<ChatCompletion, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_requests.lock().unwrap().push(request);
        if let Some(delay) = self.chat_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.chat_script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(LlmError::Decode("no scripted chat response left".to_string())))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.embed_delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.embed_errors.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }
        self.embedded_inputs.fetch_add(inputs.len(), Ordering::SeqCst);
        Ok(inputs.iter().map(|input| letter_histogram(input)).collect())
    }
}
