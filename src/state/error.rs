use thiserror::Error;

use crate::compare::CompareError;
use crate::llm::LlmError;
use crate::tokens::TokenizerError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to initialize tokenizer: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Failed to initialize LLM client: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to build comparison pipeline: {0}")]
    Pipeline(#[from] CompareError),
}
