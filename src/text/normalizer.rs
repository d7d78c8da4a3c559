//! Token normalization for corpus readers.

use crate::config::TextConfig;
use unicode_normalization::UnicodeNormalization;

/// Token normalizer that applies the configured transformations.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: TextConfig,
}

impl Normalizer {
    /// Creates a new normalizer with the given configuration.
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Creates a normalizer with default configuration.
    pub fn default_config() -> Self {
        Self::new(TextConfig::default())
    }

    /// Normalizes a single token.
    ///
    /// Returns `None` if the token should be filtered out.
    pub fn normalize_token(&self, token: &str) -> Option<String> {
        let mut result = if self.config.unicode_normalize {
            token.nfc().collect::<String>()
        } else {
            token.to_string()
        };

        if self.config.lowercase {
            result = result.to_lowercase();
        }

        if self.config.remove_punctuation {
            result.retain(|c| !c.is_ascii_punctuation());
        }

        let len = result.chars().count();
        if len == 0 || len < self.config.min_token_length || len > self.config.max_token_length {
            return None;
        }

        Some(result)
    }

    /// Normalizes a token that must keep its slot (dependency trees index
    /// tokens by position). Filtered tokens become the empty string, which
    /// never enters a vocabulary.
    pub fn normalize_in_place(&self, token: &str) -> String {
        self.normalize_token(token).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_token("KING"), Some("king".to_string()));
    }

    #[test]
    fn test_remove_punctuation() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_token("ruled."), Some("ruled".to_string()));
        assert_eq!(normalizer.normalize_token("..."), None);
    }

    #[test]
    fn test_single_char_words_kept() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_token("a"), Some("a".to_string()));
    }

    #[test]
    fn test_unicode_composition() {
        let normalizer = Normalizer::default_config();
        // "cafe" + combining acute accent composes to the precomposed form
        let decomposed = "cafe\u{0301}";
        assert_eq!(normalizer.normalize_token(decomposed), Some("café".to_string()));
    }

    #[test]
    fn test_length_filter() {
        let config = TextConfig {
            min_token_length: 3,
            max_token_length: 5,
            ..Default::default()
        };
        let normalizer = Normalizer::new(config);
        assert_eq!(normalizer.normalize_token("to"), None);
        assert_eq!(normalizer.normalize_token("kings"), Some("kings".to_string()));
        assert_eq!(normalizer.normalize_token("kingdom"), None);
    }

    #[test]
    fn test_normalize_in_place() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_in_place(","), "");
        assert_eq!(normalizer.normalize_in_place("Dog"), "dog");
    }
}
