//! Error types for the holo-embed engine.

use thiserror::Error;

/// The main error type for embedding operations.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// A query referenced a word outside the vocabulary.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A query referenced a dependency relation never seen in training.
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// A query was issued before training completed.
    #[error("Model has not been trained")]
    NotTrained,

    /// `train` was called on a model that is already trained.
    #[error("Model has already been trained")]
    AlreadyTrained,

    /// A vector of unexpected length was combined with the model's vectors.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The model dimensionality.
        expected: usize,
        /// The length that was supplied.
        found: usize,
    },

    /// A malformed query (for example a resonance phrase without a blank).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A corpus source that cannot continue.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid vector table file.
    #[error("Invalid vector table format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

impl From<bincode::Error> for EmbedError {
    fn from(err: bincode::Error) -> Self {
        EmbedError::Serialization(err.to_string())
    }
}
