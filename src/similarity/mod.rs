//! Similarity measures and top-k search over dense vectors.

mod cosine;
mod search;

pub use cosine::CosineSimilarity;
pub use search::{Hit, SimilaritySearch};

pub(crate) use search::rank;

/// Trait for similarity measures between dense vectors.
pub trait SimilarityMeasure: Sync {
    /// Computes the similarity between two equal-length vectors.
    ///
    /// Larger is more similar.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f64;

    /// Computes the distance between two vectors.
    ///
    /// Default implementation: 1.0 - similarity.
    fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        1.0 - self.similarity(a, b)
    }
}
