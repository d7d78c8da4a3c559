//! Vocabulary: symbols with stable integer indices.

use crate::corpus::{Corpus, TokenSequence};
use crate::error::Result;
use log::info;
use std::collections::HashMap;

/// Ordered set of symbols. Indices follow insertion order and never change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Creates an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary from words, keeping the first occurrence of each.
    /// Empty strings are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::new();
        for word in words {
            vocab.insert(word);
        }
        vocab
    }

    /// Builds a vocabulary from one pass over a corpus, keeping words seen
    /// at least `min_count` times in first-occurrence order.
    pub fn from_corpus<C: Corpus>(corpus: &C, min_count: usize) -> Result<Self> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for unit in corpus.units()? {
            let unit = unit?;
            for token in unit.tokens() {
                if token.is_empty() {
                    continue;
                }
                match counts.get_mut(token) {
                    Some(count) => *count += 1,
                    None => {
                        counts.insert(token.clone(), 1);
                        order.push(token.clone());
                    }
                }
            }
        }

        let total = order.len();
        let vocab = Self::from_words(
            order
                .into_iter()
                .filter(|w| counts.get(w).copied().unwrap_or(0) >= min_count),
        );
        info!(
            "Built vocabulary: {} words ({} distinct, min count {})",
            vocab.len(),
            total,
            min_count
        );
        Ok(vocab)
    }

    /// Adds `word` if absent and returns its index.
    pub fn insert<S: Into<String>>(&mut self, word: S) -> Option<usize> {
        let word = word.into();
        if word.is_empty() {
            return None;
        }
        if let Some(&idx) = self.index.get(&word) {
            return Some(idx);
        }
        let idx = self.words.len();
        self.index.insert(word.clone(), idx);
        self.words.push(word);
        Some(idx)
    }

    /// Whether `word` is in the vocabulary.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Index of `word`.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Word at `index`.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// All words in index order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Iterates over words in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::VecCorpus;

    #[test]
    fn test_insertion_order() {
        let vocab = Vocabulary::from_words(["cat", "dog", "cat", "runs"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("cat"), Some(0));
        assert_eq!(vocab.index_of("dog"), Some(1));
        assert_eq!(vocab.index_of("runs"), Some(2));
        assert_eq!(vocab.word(1), Some("dog"));
        assert!(!vocab.contains("barks"));
    }

    #[test]
    fn test_empty_word_ignored() {
        let mut vocab = Vocabulary::new();
        assert_eq!(vocab.insert(""), None);
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_from_corpus_min_count() {
        let corpus = VecCorpus::from_sentences(&["the king ruled", "the queen ruled", "a king"]);
        let vocab = Vocabulary::from_corpus(&corpus, 2).unwrap();
        assert_eq!(vocab.words(), &["the", "king", "ruled"]);

        let all = Vocabulary::from_corpus(&corpus, 1).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all.index_of("a"), Some(4));
    }
}
