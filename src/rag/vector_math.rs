use std::cmp::Ordering;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VectorError {
    #[error("Vectors must not be empty")]
    Empty,

    #[error("Vector length mismatch: {0} != {1}")]
    LengthMismatch(usize, usize),
}

pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, VectorError> {
    if query.is_empty() || candidate.is_empty() {
        return Err(VectorError::Empty);
    }
    if query.len() != candidate.len() {
        return Err(VectorError::LengthMismatch(query.len(), candidate.len()));
    }

    let dot: f32 = query.iter().zip(candidate).map(|(a, b)| a * b).sum();
    let denom = l2_norm(query) * l2_norm(candidate);
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok(dot / denom)
}

/// Indices with scores, best first. The sort is stable, so equal scores
/// keep candidate order.
pub fn rank_descending_by_cosine(
    query: &[f32],
    candidates: &[Vec<f32>],
) -> Result<Vec<(usize, f32)>, VectorError> {
    let mut scores = Vec::with_capacity(candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = cosine_similarity(query, candidate)?;
        scores.push((idx, score));
    }

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    Ok(scores)
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}
