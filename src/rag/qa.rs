use std::sync::Arc;

use thiserror::Error;

use super::index::{IndexError, RetrievalIndex, ScoredChunk};
use crate::llm::{ChatMessage, ChatRequest, LlmError, LlmProvider};

const STUFF_PROMPT_PREFIX: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.";

#[derive(Debug, Error)]
pub enum QaError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    #[error("Chat completion failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Model returned an empty answer")]
    EmptyAnswer,
}

#[derive(Debug, Clone)]
pub struct QaSettings {
    pub chat_model: String,
    pub temperature: f64,
    pub top_k: usize,
}

/// Retrieve-then-answer over a single index: the top-k chunks are stuffed
/// into one prompt together with the question.
pub struct RetrievalQa {
    index: RetrievalIndex,
    llm: Arc<dyn LlmProvider>,
    settings: QaSettings,
}

impl RetrievalQa {
    pub fn new(index: RetrievalIndex, llm: Arc<dyn LlmProvider>, settings: QaSettings) -> Self {
        Self {
            index,
            llm,
            settings,
        }
    }

    pub async fn ask(&self, question: &str) -> Result<String, QaError> {
        let hits = self.index.query(question, self.settings.top_k).await?;
        tracing::debug!(hits = hits.len(), "Retrieved context");

        let request = ChatRequest::new(vec![ChatMessage::user(stuff_prompt(&hits, question))])
            .with_temperature(self.settings.temperature);
        let completion = self.llm.chat(request, &self.settings.chat_model).await?;

        completion
            .content
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(QaError::EmptyAnswer)
    }
}

fn stuff_prompt(hits: &[ScoredChunk], question: &str) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{STUFF_PROMPT_PREFIX}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}
