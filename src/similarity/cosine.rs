//! Cosine similarity for dense vectors.

use crate::hrr::cosine_similarity;
use crate::similarity::SimilarityMeasure;

/// Cosine similarity measure.
///
/// dot(a, b) / (‖a‖·‖b‖), or 0 when either vector has zero norm.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl SimilarityMeasure for CosineSimilarity {
    fn similarity(&self, a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b)
    }
}
