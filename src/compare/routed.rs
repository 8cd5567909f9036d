use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::error::CompareError;
use super::strategy::{elapsed_ms, within, AnsweringStrategy, PipelineContext};
use super::types::{AnswerResult, DocumentSet, Phase};
use crate::agent::instructions::{render_question, tool_description};
use crate::agent::{AgentExecutor, AgentTool, ToolError};
use crate::rag::{DocumentId, RetrievalIndex, RetrievalQa};

/// Retrieval QA over one document, callable by the agent.
pub struct DocumentQaTool {
    name: String,
    description: String,
    qa: RetrievalQa,
}

impl DocumentQaTool {
    pub fn new(document: DocumentId, qa: RetrievalQa) -> Self {
        let label = document.label();
        Self {
            name: format!("{label}-QA"),
            description: tool_description(&label),
            qa,
        }
    }
}

#[async_trait]
impl AgentTool for DocumentQaTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        self.qa.ask(input).await.map_err(|e| ToolError {
            tool: self.name.clone(),
            message: e.to_string(),
        })
    }
}

/// One index per document, each exposed as a tool to a bounded agent.
pub struct ToolRoutedRetrieval {
    ctx: PipelineContext,
}

impl ToolRoutedRetrieval {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    async fn build_index(&self, text: &str, document: DocumentId) -> Result<RetrievalIndex, CompareError> {
        let chunks = self.ctx.corpus.build_chunks(text, document);
        tracing::debug!(document = %document, chunks = chunks.len(), "Embedding document");
        RetrievalIndex::build(chunks, self.ctx.llm.clone(), &self.ctx.index)
            .await
            .map_err(CompareError::EmbeddingService)
    }
}

#[async_trait]
impl AnsweringStrategy for ToolRoutedRetrieval {
    async fn answer(&self, docs: &DocumentSet) -> Result<AnswerResult, CompareError> {
        let embed_started = Instant::now();
        let (first, second) = within(Phase::Embed, self.ctx.timeouts.embed(), async {
            tokio::try_join!(
                self.build_index(&docs.doc1, DocumentId::First),
                self.build_index(&docs.doc2, DocumentId::Second),
            )
        })
        .await?;
        let elapsed_embed_ms = elapsed_ms(embed_started);
        tracing::info!(elapsed_ms = elapsed_embed_ms, "Per-document indices ready");

        let tools: Vec<Arc<dyn AgentTool>> = [(DocumentId::First, first), (DocumentId::Second, second)]
            .into_iter()
            .map(|(document, index)| {
                let qa = RetrievalQa::new(index, self.ctx.llm.clone(), self.ctx.qa.clone());
                Arc::new(DocumentQaTool::new(document, qa)) as Arc<dyn AgentTool>
            })
            .collect();

        let executor = AgentExecutor::new(self.ctx.llm.clone(), self.ctx.qa.chat_model.clone())
            .with_temperature(self.ctx.qa.temperature)
            .with_max_steps(self.ctx.agent.max_steps)
            .with_system_prefix(self.ctx.agent.system_prefix.clone());
        let input = render_question(&self.ctx.agent.question_template, &docs.question);

        let chain_started = Instant::now();
        let outcome = within(Phase::Chain, self.ctx.timeouts.chain(), async {
            executor
                .run(&tools, &input)
                .await
                .map_err(|e| CompareError::ChainExecution(e.to_string()))
        })
        .await?;
        let elapsed_chain_ms = elapsed_ms(chain_started);
        tracing::info!(steps = outcome.steps.len(), elapsed_ms = elapsed_chain_ms, "Agent finished");

        Ok(AnswerResult {
            answer: outcome.answer,
            elapsed_embed_ms,
            elapsed_chain_ms,
            model_name: self.ctx.model_name().to_string(),
            steps: outcome.steps,
        })
    }
}
