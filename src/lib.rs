//! # holo-embed - Holographic Word Embeddings
//!
//! holo-embed builds distributional word representations with random
//! indexing and holographic reduced representations (HRR), and answers
//! similarity, completion and relation queries against them.
//!
//! ## Overview
//!
//! Every vocabulary word gets a fixed random base vector. Training streams a
//! corpus and adds, for each word, the base vectors of its neighbours into
//! a composite vector. The order and syntax variants first bind each
//! neighbour to a role vector (its relative position, or its dependency
//! relation) with circular convolution, so the role can be unbound again at
//! query time.
//!
//! ## Key Features
//!
//! - **Three models**: context (random indexing), order (position binding)
//!   and syntax (dependency relation binding)
//! - **Deterministic** base and role vectors derived from a single seed
//! - **Parallel training** with per-symbol lock striping and batch-atomic updates
//! - **Cosine top-k search** over composites or base vectors
//! - **Flat binary format** for trained vector tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use holo_embed::{EmbeddingConfig, OrderModel, VecCorpus, Vocabulary};
//!
//! let corpus = VecCorpus::from_sentences(&["the king ruled", "the queen ruled"]);
//! let vocab = Vocabulary::from_corpus(&corpus, 1)?;
//!
//! let mut model = OrderModel::new(vocab, EmbeddingConfig::default())?;
//! model.train(&corpus)?;
//!
//! let nearest = model.get_nearest("king", 5)?;
//! let next = model.get_completions("the", 1, 5)?;
//! let blank = model.get_resonants("the _ ruled", 5)?;
//! model.save("royals.hrr")?;
//! ```
//!
//! ## Architecture
//!
//! - [`hrr`] - Vector primitives, binding algebra and the seeded vector space
//! - [`model`] - Accumulator, encoders, training loop and query surface
//! - [`similarity`] - Cosine measure and top-k search
//! - [`corpus`] - Corpus sources (in-memory, plain text, CoNLL-U)
//! - [`vocab`] - Vocabulary with stable indices
//! - [`text`] - Tokenization and normalization for the corpus readers
//! - [`storage`] - Binary format and persistence

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod hrr;
pub mod model;
pub mod similarity;
pub mod storage;
pub mod text;
pub mod vocab;

// Re-export commonly used types
pub use config::{Config, EmbeddingConfig, TextConfig};
pub use corpus::{ConllCorpus, Corpus, DependencyEdge, DependencyTree, Sentence, TextCorpus, VecCorpus};
pub use error::{EmbedError, Result};
pub use hrr::{bind, cosine_similarity, involution, superpose, unbind, Role, Vector, VectorSpace};
pub use model::{
    AbortHandle, Accumulator, ContextModel, EmbeddingModel, Encoder, ModelKind, ModelState,
    OrderModel, ResonanceWeighting, SyntaxModel, TrainingReport, Update,
};
pub use similarity::{CosineSimilarity, Hit, SimilarityMeasure, SimilaritySearch};
pub use storage::{TableFormat, TableHeader, TableMeta};
pub use text::{Normalizer, Tokenizer};
pub use vocab::Vocabulary;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default vector dimensionality.
pub const DEFAULT_DIM: usize = 512;

/// Default context window half-width.
pub const DEFAULT_WINDOW: usize = 2;

/// Default number of results returned by queries.
pub const DEFAULT_TOP_K: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_constants_match_config_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(DEFAULT_DIM, config.dim);
        assert_eq!(DEFAULT_WINDOW, config.window);
        assert_eq!(DEFAULT_TOP_K, 5);
    }
}
