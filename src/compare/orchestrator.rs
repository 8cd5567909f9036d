use std::sync::Arc;

use super::concat::ConcatenatedRetrieval;
use super::error::CompareError;
use super::routed::ToolRoutedRetrieval;
use super::strategy::{AnsweringStrategy, PipelineContext};
use super::types::{AnswerResult, CompareForm, DocumentSet, Strategy};
use crate::core::config::AppConfig;
use crate::llm::LlmProvider;
use crate::tokens::TokenBudget;

/// Validates a raw request, gates it on the token budget and hands it to
/// the selected strategy.
#[derive(Clone)]
pub struct ComparisonService {
    credential_configured: bool,
    model_name: String,
    budget: TokenBudget,
    concatenated: Arc<dyn AnsweringStrategy>,
    tool_routed: Arc<dyn AnsweringStrategy>,
}

impl ComparisonService {
    pub fn new(
        config: &AppConfig,
        llm: Arc<dyn LlmProvider>,
        budget: TokenBudget,
    ) -> Result<Self, CompareError> {
        let ctx = PipelineContext::from_config(config, llm)?;
        Ok(Self {
            credential_configured: config.llm.credential().is_some(),
            model_name: ctx.model_name().to_string(),
            budget,
            concatenated: Arc::new(ConcatenatedRetrieval::new(ctx.clone())),
            tool_routed: Arc::new(ToolRoutedRetrieval::new(ctx)),
        })
    }

    pub fn credential_configured(&self) -> bool {
        self.credential_configured
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub async fn compare(&self, form: CompareForm) -> Result<AnswerResult, CompareError> {
        let result = self.run(form).await;
        match &result {
            Ok(answer) => tracing::info!(
                elapsed_embed_ms = answer.elapsed_embed_ms,
                elapsed_chain_ms = answer.elapsed_chain_ms,
                steps = answer.steps.len(),
                "Comparison succeeded"
            ),
            Err(err) => tracing::error!(kind = err.kind(), error = %err, "Comparison failed"),
        }
        result
    }

    async fn run(&self, form: CompareForm) -> Result<AnswerResult, CompareError> {
        if !self.credential_configured {
            return Err(CompareError::Configuration(
                "OpenAI API key is not configured".to_string(),
            ));
        }

        let strategy: Strategy = form.comparison.parse()?;

        if form.query.trim().is_empty() {
            return Err(CompareError::InvalidInput("question must not be empty".to_string()));
        }

        let docs = Arc::new(DocumentSet {
            doc1: form.doc1,
            doc2: form.doc2,
            question: form.query,
            strategy,
        });
        let tokens = self.budget.check(Arc::clone(&docs)).await?;
        tracing::info!(%strategy, tokens, "Dispatching comparison");

        self.pipeline(strategy).answer(&docs).await
    }

    fn pipeline(&self, strategy: Strategy) -> &dyn AnsweringStrategy {
        match strategy {
            Strategy::Concatenated => self.concatenated.as_ref(),
            Strategy::ToolRouted => self.tool_routed.as_ref(),
        }
    }
}
