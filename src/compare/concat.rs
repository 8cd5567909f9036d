use std::time::Instant;

use async_trait::async_trait;

use super::error::CompareError;
use super::strategy::{elapsed_ms, within, AnsweringStrategy, PipelineContext};
use super::types::{AnswerResult, DocumentSet, Phase};
use crate::rag::{RetrievalIndex, RetrievalQa};

/// Both documents in one index, answered by a single retrieval QA call.
pub struct ConcatenatedRetrieval {
    ctx: PipelineContext,
}

impl ConcatenatedRetrieval {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl AnsweringStrategy for ConcatenatedRetrieval {
    async fn answer(&self, docs: &DocumentSet) -> Result<AnswerResult, CompareError> {
        let embed_started = Instant::now();
        let chunks = self.ctx.corpus.build_merged(&docs.doc1, &docs.doc2);
        let chunk_count = chunks.len();
        let index = within(Phase::Embed, self.ctx.timeouts.embed(), async {
            RetrievalIndex::build(chunks, self.ctx.llm.clone(), &self.ctx.index)
                .await
                .map_err(CompareError::EmbeddingService)
        })
        .await?;
        let elapsed_embed_ms = elapsed_ms(embed_started);
        tracing::info!(chunks = chunk_count, elapsed_ms = elapsed_embed_ms, "Merged index ready");

        let chain_started = Instant::now();
        let qa = RetrievalQa::new(index, self.ctx.llm.clone(), self.ctx.qa.clone());
        let answer = within(Phase::Chain, self.ctx.timeouts.chain(), async {
            qa.ask(&docs.question)
                .await
                .map_err(|e| CompareError::ChainExecution(e.to_string()))
        })
        .await?;
        let elapsed_chain_ms = elapsed_ms(chain_started);

        Ok(AnswerResult {
            answer,
            elapsed_embed_ms,
            elapsed_chain_ms,
            model_name: self.ctx.model_name().to_string(),
            steps: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Strategy;
    use crate::core::config::AppConfig;
    use crate::llm::mock::ScriptedProvider;
    use crate::llm::LlmError;
    use std::sync::Arc;
    use std::time::Duration;

    fn docs() -> DocumentSet {
        DocumentSet {
            doc1: "Paris is the capital of France.".to_string(),
            doc2: "Berlin is the capital of Germany.".to_string(),
            question: "Which city is larger?".to_string(),
            strategy: Strategy::Concatenated,
        }
    }

    fn strategy(mock: Arc<ScriptedProvider>) -> ConcatenatedRetrieval {
        ConcatenatedRetrieval::new(PipelineContext::from_config(&AppConfig::default(), mock).unwrap())
    }

    #[tokio::test]
    async fn answers_with_empty_steps() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat_text("Berlin is larger.");

        let result = strategy(mock.clone()).answer(&docs()).await.unwrap();
        assert_eq!(result.answer, "Berlin is larger.");
        assert!(result.steps.is_empty());
        assert_eq!(result.model_name, "gpt-4-0613");
        // one batch for both documents, one for the question
        assert_eq!(mock.embed_calls(), 2);
        assert_eq!(mock.chat_calls(), 1);
    }

    #[tokio::test]
    async fn index_failure_is_an_embedding_error() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_embed_error(LlmError::Decode("bad payload".to_string()));

        let err = strategy(mock.clone()).answer(&docs()).await.unwrap_err();
        assert!(matches!(err, CompareError::EmbeddingService(_)));
        assert_eq!(mock.chat_calls(), 0);
    }

    #[tokio::test]
    async fn llm_failure_is_a_chain_error() {
        let mock = Arc::new(ScriptedProvider::new());
        mock.push_chat_error(LlmError::Status {
            endpoint: "chat",
            status: 400,
            body: "context length exceeded".to_string(),
        });

        let err = strategy(mock).answer(&docs()).await.unwrap_err();
        assert!(matches!(err, CompareError::ChainExecution(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_embedding_hits_embed_deadline_before_any_chat() {
        let mut config = AppConfig::default();
        config.timeouts.embed_secs = 5;
        let mock = Arc::new(ScriptedProvider::new().with_embed_delay(Duration::from_secs(60)));
        mock.push_chat_text("never asked");
        let concat = ConcatenatedRetrieval::new(PipelineContext::from_config(&config, mock.clone()).unwrap());

        let err = concat.answer(&docs()).await.unwrap_err();
        assert!(matches!(err, CompareError::Timeout(Phase::Embed)));
        assert_eq!(mock.embed_calls(), 1);
        assert_eq!(mock.chat_calls(), 0);
    }
}
