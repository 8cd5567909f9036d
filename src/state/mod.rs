use std::sync::Arc;

use crate::compare::ComparisonService;
use crate::core::config::AppConfig;
use crate::llm::{LlmProvider, OpenAiProvider, RetryPolicy, RetryingProvider};
use crate::tokens::TokenBudget;

pub mod error;

use error::InitializationError;

/// Shared, read-only state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub comparison: ComparisonService,
}

impl AppState {
    /// Builds the OpenAI client (wrapped in bounded retry), the tokenizer
    /// and the comparison pipeline from a loaded configuration.
    pub fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let client = OpenAiProvider::from_settings(&config.llm)?;
        let llm: Arc<dyn LlmProvider> = Arc::new(RetryingProvider::new(
            Arc::new(client),
            RetryPolicy::from_settings(&config.llm),
        ));
        Self::with_provider(config, llm)
    }

    pub fn with_provider(
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Arc<Self>, InitializationError> {
        let budget = TokenBudget::new(config.budget.token_limit)?;
        let comparison = ComparisonService::new(&config, llm, budget)?;
        Ok(Arc::new(Self {
            config: Arc::new(config),
            comparison,
        }))
    }
}
