use axum::http::StatusCode;
use thiserror::Error;

use super::types::Phase;
use crate::rag::IndexError;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Token budget exceeded: {count} tokens (limit {limit})")]
    BudgetExceeded { count: usize, limit: usize },

    #[error("Failed to create vector store: {0}")]
    EmbeddingService(#[source] IndexError),

    #[error("Failed to call LLM chain: {0}")]
    ChainExecution(String),

    #[error("Unknown comparison strategy: {0:?}")]
    UnknownStrategy(String),

    #[error("{0} phase timed out")]
    Timeout(Phase),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompareError {
    /// Stable identifier reported to clients in place of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            CompareError::Configuration(_) => "configuration",
            CompareError::InvalidInput(_) => "invalid_input",
            CompareError::BudgetExceeded { .. } => "budget_exceeded",
            CompareError::EmbeddingService(_) => "embedding_service",
            CompareError::ChainExecution(_) => "chain_execution",
            CompareError::UnknownStrategy(_) => "unknown_strategy",
            CompareError::Timeout(_) => "timeout",
            CompareError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CompareError::InvalidInput(_)
            | CompareError::BudgetExceeded { .. }
            | CompareError::UnknownStrategy(_) => StatusCode::BAD_REQUEST,
            CompareError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            CompareError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CompareError::EmbeddingService(_) | CompareError::ChainExecution(_) => {
                StatusCode::BAD_GATEWAY
            }
            CompareError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
