use std::sync::Arc;

use thiserror::Error;

use super::corpus::Chunk;
use super::vector_math::{rank_descending_by_cosine, VectorError};
use crate::llm::{LlmError, LlmProvider};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Embedding request failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("Embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding vectors are inconsistent: {0}")]
    Vector(#[from] VectorError),
}

#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub embedding_model: String,
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// In-memory similarity index over one request's chunks.
pub struct RetrievalIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    embedder: Arc<dyn LlmProvider>,
    embedding_model: String,
}

impl RetrievalIndex {
    pub async fn build(
        mut chunks: Vec<Chunk>,
        embedder: Arc<dyn LlmProvider>,
        settings: &IndexSettings,
    ) -> Result<Self, IndexError> {
        // Equal scores rank by (document, sequence_index).
        chunks.sort_by_key(|chunk| (chunk.document, chunk.sequence_index));

        let inputs: Vec<String> = chunks.iter().map(|c| embedding_input(&c.text)).collect();
        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(settings.batch_size.max(1)) {
            let embedded = embedder.embed(batch, &settings.embedding_model).await?;
            if embedded.len() != batch.len() {
                return Err(IndexError::CountMismatch {
                    expected: batch.len(),
                    actual: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        if let Some(first) = vectors.first() {
            let dim = first.len();
            if dim == 0 {
                return Err(VectorError::Empty.into());
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
                return Err(VectorError::LengthMismatch(dim, bad.len()).into());
            }
        }

        tracing::debug!(
            chunks = chunks.len(),
            model = %settings.embedding_model,
            "Built retrieval index"
        );

        Ok(Self {
            chunks,
            vectors,
            embedder,
            embedding_model: settings.embedding_model.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Up to `k` chunks, most similar first.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedded = self
            .embedder
            .embed(&[embedding_input(text)], &self.embedding_model)
            .await?;
        let query_vector = embedded.into_iter().next().ok_or(IndexError::CountMismatch {
            expected: 1,
            actual: 0,
        })?;

        let ranked = rank_descending_by_cosine(&query_vector, &self.vectors)?;
        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| ScoredChunk {
                chunk: self.chunks[idx].clone(),
                score,
            })
            .collect())
    }
}

fn embedding_input(text: &str) -> String {
    text.replace('\n', " ")
}
