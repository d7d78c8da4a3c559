//! Text processing for the corpus readers: tokenization and normalization.

mod normalizer;
mod tokenizer;

pub use normalizer::Normalizer;
pub use tokenizer::Tokenizer;
