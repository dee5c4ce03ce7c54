//! Cosine similarity and ranking of embedding vectors.

use crate::error::ProviderError;
use std::cmp::Ordering;

pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, ProviderError> {
    if query.len() != candidate.len() {
        return Err(ProviderError::DimensionMismatch {
            expected: candidate.len(),
            actual: query.len(),
        });
    }

    let dot: f32 = query.iter().zip(candidate).map(|(a, b)| a * b).sum();
    let denom = l2_norm(query) * l2_norm(candidate);
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok(dot / denom)
}

/// Candidate indices ordered by descending similarity. Ties keep corpus order.
pub fn rank_descending_by_cosine(
    query: &[f32],
    candidates: &[Vec<f32>],
) -> Result<Vec<(usize, f32)>, ProviderError> {
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
