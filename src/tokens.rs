//! Token budgeting for incoming comparison requests.
//!
//! Counts use the cl100k_base encoding with no special-token handling, so
//! the count for a given text never changes between calls or processes.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tiktoken_rs::CoreBPE;

use crate::compare::{CompareError, DocumentSet};

#[derive(Debug, Error)]
#[error("Failed to load cl100k_base tokenizer: {0}")]
pub struct TokenizerError(String);

static CL100K: OnceLock<Result<Arc<CoreBPE>, String>> = OnceLock::new();

fn cl100k() -> Result<Arc<CoreBPE>, TokenizerError> {
    CL100K
        .get_or_init(|| {
            tiktoken_rs::cl100k_base()
                .map(Arc::new)
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(TokenizerError)
}

/// Running total of a budget count. `Over` carries the total at the point
/// counting stopped, which is a lower bound of the full count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Within(usize),
    Over(usize),
}

/// Rejects requests whose combined token count is above `limit`.
#[derive(Clone)]
pub struct TokenBudget {
    bpe: Arc<CoreBPE>,
    limit: usize,
}

impl TokenBudget {
    pub fn new(limit: usize) -> Result<Self, TokenizerError> {
        Ok(Self {
            bpe: cl100k()?,
            limit,
        })
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Counts `texts` in order and stops at the first one that pushes the
    /// total past the limit. Exactly `limit` is within.
    pub fn tally(&self, texts: &[&str]) -> Tally {
        let mut total = 0;
        for text in texts {
            total += self.count_tokens(text);
            if total > self.limit {
                return Tally::Over(total);
            }
        }
        Tally::Within(total)
    }

    /// Counts the question and both documents on the blocking pool and
    /// returns the total when it fits.
    pub async fn check(&self, docs: Arc<DocumentSet>) -> Result<usize, CompareError> {
        let budget = self.clone();
        let tally = tokio::task::spawn_blocking(move || {
            budget.tally(&[docs.question.as_str(), docs.doc1.as_str(), docs.doc2.as_str()])
        })
        .await
        .map_err(|e| CompareError::Internal(format!("Token counting task failed: {}", e)))?;

        match tally {
            Tally::Within(count) => {
                tracing::debug!(count, limit = self.limit, "Token budget ok");
                Ok(count)
            }
            Tally::Over(count) => {
                tracing::warn!(count, limit = self.limit, "Token budget exceeded");
                Err(CompareError::BudgetExceeded {
                    count,
                    limit: self.limit,
                })
            }
        }
    }
}

impl std::fmt::Debug for TokenBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBudget")
            .field("encoding", &"cl100k_base")
            .field("limit", &self.limit)
            .finish()
    }
}
