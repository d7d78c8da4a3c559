//! Sentence tokenization for plain-text corpora.

use crate::config::TextConfig;
use crate::text::Normalizer;
use unicode_segmentation::UnicodeSegmentation;

/// Splits a sentence into normalized Unicode words.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    normalizer: Normalizer,
}

impl Tokenizer {
    /// Creates a new tokenizer with the given configuration.
    pub fn new(config: TextConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    /// Creates a tokenizer with default configuration.
    pub fn default_config() -> Self {
        Self::new(TextConfig::default())
    }

    /// Tokenizes one sentence into its normalized words, in order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(|word| self.normalizer.normalize_token(word))
            .collect()
    }

    /// The underlying normalizer.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::default_config()
    }
}
