//! Configuration for the holo-embed engine.

use crate::error::{EmbedError, Result};
use serde::{Deserialize, Serialize};

/// Main configuration: embedding model plus corpus text handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model configuration.
    pub embedding: EmbeddingConfig,

    /// Text processing configuration for the corpus readers.
    pub text: TextConfig,
}

/// Embedding model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Vector dimensionality D shared by base, role and composite vectors.
    /// Default: 512.
    pub dim: usize,

    /// Number of corpus units (sentences or trees) encoded between
    /// accumulator synchronization points.
    /// Default: 256.
    pub batch_size: usize,

    /// Half-width of the context window (Context and Order models).
    /// Default: 2.
    pub window: usize,

    /// Random seed for base and role vectors.
    /// Default: None (drawn from entropy when the model is built).
    pub seed: Option<u64>,

    /// Number of passes over the corpus.
    /// Default: 1.
    pub epochs: usize,

    /// Draw role and position vectors as unitary vectors, whose involution
    /// is an exact inverse under circular convolution.
    /// Default: false.
    pub unitary_roles: bool,

    /// Number of worker threads for training.
    /// Default: 0 (use the global rayon pool).
    pub num_threads: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dim: 512,
            batch_size: 256,
            window: 2,
            seed: None,
            epochs: 1,
            unitary_roles: false,
            num_threads: 0,
        }
    }
}

impl EmbeddingConfig {
    /// Checks that every size parameter is positive.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(EmbedError::Config("dim must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(EmbedError::Config("batch_size must be positive".to_string()));
        }
        if self.window == 0 {
            return Err(EmbedError::Config("window must be positive".to_string()));
        }
        if self.epochs == 0 {
            return Err(EmbedError::Config("epochs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Text processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Convert all text to lowercase.
    /// Default: true.
    pub lowercase: bool,

    /// Minimum token length (in chars) to include.
    /// Default: 1.
    pub min_token_length: usize,

    /// Maximum token length (in chars) to include.
    /// Default: 50.
    pub max_token_length: usize,

    /// Remove punctuation characters from tokens.
    /// Default: true.
    pub remove_punctuation: bool,

    /// Apply Unicode normalization (NFC).
    /// Default: true.
    pub unicode_normalize: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            min_token_length: 1,
            max_token_length: 50,
            remove_punctuation: true,
            unicode_normalize: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding.dim, 512);
        assert_eq!(config.embedding.window, 2);
        assert!(config.embedding.seed.is_none());
        assert!(config.text.lowercase);
        assert!(config.embedding.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let zero_dim = EmbeddingConfig { dim: 0, ..Default::default() };
        assert!(matches!(zero_dim.validate(), Err(EmbedError::Config(_))));

        let zero_batch = EmbeddingConfig { batch_size: 0, ..Default::default() };
        assert!(zero_batch.validate().is_err());

        let zero_window = EmbeddingConfig { window: 0, ..Default::default() };
        assert!(zero_window.validate().is_err());
    }
}
