//! Exhaustive top-k ranking over a vector table.

use crate::similarity::{CosineSimilarity, SimilarityMeasure};
use rayon::prelude::*;

/// A ranked candidate: row index into the searched table and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Row index (vocabulary index for model tables).
    pub index: usize,
    /// Similarity to the query.
    pub score: f64,
}

/// Brute-force similarity search, O(N·D) per query.
#[derive(Debug, Clone, Default)]
pub struct SimilaritySearch<M = CosineSimilarity> {
    measure: M,
}

impl SimilaritySearch<CosineSimilarity> {
    /// Cosine search.
    pub fn cosine() -> Self {
        Self {
            measure: CosineSimilarity,
        }
    }
}

impl<M: SimilarityMeasure> SimilaritySearch<M> {
    /// Search with a custom measure.
    pub fn with_measure(measure: M) -> Self {
        Self { measure }
    }

    /// Scores every row against `query`, in row order.
    pub fn score_all<V>(&self, query: &[f32], rows: &[V]) -> Vec<f64>
    where
        V: AsRef<[f32]> + Sync,
    {
        rows.par_iter()
            .map(|row| self.measure.similarity(query, row.as_ref()))
            .collect()
    }

    /// The `k` best rows, descending by score; ties keep row order.
    pub fn top_k<V>(&self, query: &[f32], rows: &[V], k: usize) -> Vec<Hit>
    where
        V: AsRef<[f32]> + Sync,
    {
        if k == 0 {
            return Vec::new();
        }
        rank(self.score_all(query, rows), k)
    }
}

/// Sorts scores descending (stable, so equal scores keep row order) and
/// keeps the first `k`.
pub(crate) fn rank(scores: Vec<f64>, k: usize) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| Hit { index, score })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(k);
    hits
}
