use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::error::CompareError;
use super::types::{AnswerResult, DocumentSet, Phase};
use crate::core::config::{AgentSettings, AppConfig, TimeoutSettings};
use crate::llm::LlmProvider;
use crate::rag::{CorpusBuilder, IndexSettings, QaSettings, RecursiveSplitter};

#[async_trait]
pub trait AnsweringStrategy: Send + Sync {
    async fn answer(&self, docs: &DocumentSet) -> Result<AnswerResult, CompareError>;
}

/// Everything a strategy needs besides the request itself. Immutable and
/// shared by all requests.
#[derive(Clone)]
pub struct PipelineContext {
    pub llm: Arc<dyn LlmProvider>,
    pub corpus: CorpusBuilder,
    pub index: IndexSettings,
    pub qa: QaSettings,
    pub agent: AgentSettings,
    pub timeouts: TimeoutSettings,
}

impl PipelineContext {
    pub fn from_config(config: &AppConfig, llm: Arc<dyn LlmProvider>) -> Result<Self, CompareError> {
        let splitter = RecursiveSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap)
            .map_err(|e| CompareError::Configuration(e.to_string()))?;

        Ok(Self {
            llm,
            corpus: CorpusBuilder::new(splitter),
            index: IndexSettings {
                embedding_model: config.llm.embedding_model.clone(),
                batch_size: config.retrieval.embedding_batch_size,
            },
            qa: QaSettings {
                chat_model: config.llm.chat_model.clone(),
                temperature: config.llm.temperature,
                top_k: config.retrieval.top_k,
            },
            agent: config.agent.clone(),
            timeouts: config.timeouts.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.qa.chat_model
    }
}

/// Runs `fut` under the deadline for `phase`.
pub async fn within<T, F>(phase: Phase, limit: Duration, fut: F) -> Result<T, CompareError>
where
    F: Future<Output = Result<T, CompareError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(%phase, limit_secs = limit.as_secs(), "Phase deadline elapsed");
            Err(CompareError::Timeout(phase))
        }
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
