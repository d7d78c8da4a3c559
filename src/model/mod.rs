//! Embedding models.
//!
//! One generic [`EmbeddingModel`] drives training and queries; the variant
//! is chosen by its [`Encoder`]:
//!
//! - [`ContextModel`]: random indexing over co-occurrence windows
//! - [`OrderModel`]: position-bound neighbours, with completion and
//!   resonance queries
//! - [`SyntaxModel`]: relation-bound dependency neighbours
//!
//! A model moves through `Uninitialized → Training → Trained` exactly once.
//! Queries require `Trained`; composites are read-only from then on.

pub mod accumulator;
pub mod encoder;
mod order;
mod syntax;
pub mod training;

pub use accumulator::{Accumulator, Update};
pub use encoder::{ContextEncoder, EncodeContext, Encoded, Encoder, OrderEncoder, SyntaxEncoder};
pub use order::{ResonanceWeighting, BLANK};
pub use training::{AbortHandle, TrainingReport};

use crate::config::EmbeddingConfig;
use crate::corpus::Corpus;
use crate::error::{EmbedError, Result};
use crate::hrr::{Vector, VectorSpace};
use crate::similarity::{Hit, SimilaritySearch};
use crate::storage::{TableFormat, TableMeta};
use crate::vocab::Vocabulary;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Model variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Co-occurrence (random indexing).
    Context,
    /// Word order (position binding).
    Order,
    /// Dependency relations (relation binding).
    Syntax,
}

impl ModelKind {
    /// Numeric tag used in the file header.
    pub fn as_u16(self) -> u16 {
        match self {
            ModelKind::Context => 0,
            ModelKind::Order => 1,
            ModelKind::Syntax => 2,
        }
    }

    /// Parses a file header tag.
    pub fn from_u16(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(ModelKind::Context),
            1 => Some(ModelKind::Order),
            2 => Some(ModelKind::Syntax),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Context => "context",
            ModelKind::Order => "order",
            ModelKind::Syntax => "syntax",
        };
        f.write_str(name)
    }
}

/// Training lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Built, not trained.
    Uninitialized,
    /// A training pass is running.
    Training,
    /// Composites are final and queryable.
    Trained,
}

/// Co-occurrence model.
pub type ContextModel = EmbeddingModel<ContextEncoder>;
/// Word-order model.
pub type OrderModel = EmbeddingModel<OrderEncoder>;
/// Dependency model.
pub type SyntaxModel = EmbeddingModel<SyntaxEncoder>;

/// An embedding model over a fixed vocabulary.
pub struct EmbeddingModel<E: Encoder> {
    config: EmbeddingConfig,
    vocab: Vocabulary,
    space: VectorSpace,
    encoder: E,
    state: ModelState,
    composites: Vec<Vector>,
    relations: BTreeSet<String>,
    search: SimilaritySearch,
}

impl<E: Encoder> EmbeddingModel<E> {
    /// Creates an untrained model.
    ///
    /// When `config.seed` is `None` a seed is drawn from entropy and written
    /// back into the model's config, so saved tables can be reproduced.
    pub fn new(vocab: Vocabulary, mut config: EmbeddingConfig) -> Result<Self> {
        config.validate()?;
        let seed = *config.seed.get_or_insert_with(rand::random);
        let space = VectorSpace::new(config.dim, seed, config.unitary_roles);
        let encoder = E::from_config(&config);

        Ok(Self {
            config,
            vocab,
            space,
            encoder,
            state: ModelState::Uninitialized,
            composites: Vec::new(),
            relations: BTreeSet::new(),
            search: SimilaritySearch::cosine(),
        })
    }

    /// Model variant.
    pub fn kind(&self) -> ModelKind {
        E::KIND
    }

    /// Lifecycle state.
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Whether queries are allowed.
    pub fn is_trained(&self) -> bool {
        self.state == ModelState::Trained
    }

    /// Model configuration (with the resolved seed).
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Model vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Base and role vectors.
    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    /// Seed every base and role vector derives from.
    pub fn seed(&self) -> u64 {
        self.space.seed()
    }

    /// Trains over `corpus`. May be called once.
    pub fn train<C>(&mut self, corpus: &C) -> Result<TrainingReport>
    where
        C: Corpus<Unit = E::Unit> + Sync + ?Sized,
    {
        self.train_with_abort(corpus, &AbortHandle::new())
    }

    /// Trains over `corpus`, stopping early between batches if `abort` is
    /// set. An aborted run keeps every applied batch and still ends
    /// `Trained`; an error resets the model to `Uninitialized`.
    pub fn train_with_abort<C>(&mut self, corpus: &C, abort: &AbortHandle) -> Result<TrainingReport>
    where
        C: Corpus<Unit = E::Unit> + Sync + ?Sized,
    {
        if self.state != ModelState::Uninitialized {
            return Err(EmbedError::AlreadyTrained);
        }
        self.state = ModelState::Training;

        info!(
            "Training {} model: {} words, dim {}, window {}, batch size {}, {} epoch(s)",
            E::KIND,
            self.vocab.len(),
            self.config.dim,
            self.config.window,
            self.config.batch_size,
            self.config.epochs
        );

        match self.run_training(corpus, abort) {
            Ok((report, rows)) => {
                self.composites = rows;
                self.relations = self.space.relation_labels().into_iter().collect();
                self.state = ModelState::Trained;
                info!(
                    "Training complete in {:.2?}: {} units, {} updates, {} unknown tokens{}",
                    report.elapsed,
                    report.units,
                    report.updates,
                    report.skipped_tokens,
                    if report.aborted { " (aborted)" } else { "" }
                );
                Ok(report)
            }
            Err(e) => {
                self.composites.clear();
                self.state = ModelState::Uninitialized;
                Err(e)
            }
        }
    }

    fn run_training<C>(&mut self, corpus: &C, abort: &AbortHandle) -> Result<(TrainingReport, Vec<Vector>)>
    where
        C: Corpus<Unit = E::Unit> + Sync + ?Sized,
    {
        self.encoder.prepare(&self.space);
        let base = self.space.base_table(self.vocab.words());
        let accumulator = Accumulator::new(self.vocab.len(), self.config.dim);

        let ctx = EncodeContext {
            vocab: &self.vocab,
            space: &self.space,
            base: &base,
        };
        let encoder = &self.encoder;
        let config = &self.config;
        let run = || training::run(encoder, corpus, &ctx, &accumulator, config, abort);

        let report = if config.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .build()
                .map_err(|e| EmbedError::Config(format!("thread pool: {e}")))?;
            pool.install(run)?
        } else {
            run()?
        };

        Ok((report, accumulator.into_rows()))
    }

    fn ensure_trained(&self) -> Result<()> {
        if self.is_trained() {
            Ok(())
        } else {
            Err(EmbedError::NotTrained)
        }
    }

    fn index_of(&self, word: &str) -> Result<usize> {
        self.vocab
            .index_of(word)
            .ok_or_else(|| EmbedError::UnknownSymbol(word.to_string()))
    }

    fn named(&self, hits: Vec<Hit>) -> Vec<(String, f64)> {
        hits.into_iter()
            .filter_map(|hit| self.vocab.word(hit.index).map(|w| (w.to_string(), hit.score)))
            .collect()
    }

    /// Ranks candidate rows against `query`; `pinned` gets score 1.0.
    fn rank_rows<V>(&self, query: &[f32], rows: &[V], pinned: Option<usize>, k: usize) -> Vec<(String, f64)>
    where
        V: AsRef<[f32]> + Sync,
    {
        if k == 0 {
            return Vec::new();
        }
        let mut scores = self.search.score_all(query, rows);
        if let Some(score) = pinned.and_then(|i| scores.get_mut(i)) {
            *score = 1.0;
        }
        self.named(crate::similarity::rank(scores, k))
    }

    /// Composite vector of `word`.
    pub fn vector(&self, word: &str) -> Result<&[f32]> {
        self.ensure_trained()?;
        let idx = self.index_of(word)?;
        Ok(&self.composites[idx])
    }

    /// All composite vectors, by vocabulary index.
    pub fn composites(&self) -> Result<&[Vector]> {
        self.ensure_trained()?;
        Ok(&self.composites)
    }

    /// The `k` words whose composites are most cosine-similar to that of
    /// `word`. The word itself is included with score 1.0; ties keep
    /// vocabulary order.
    pub fn get_nearest(&self, word: &str, k: usize) -> Result<Vec<(String, f64)>> {
        self.ensure_trained()?;
        let idx = self.index_of(word)?;
        Ok(self.rank_rows(&self.composites[idx], &self.composites, Some(idx), k))
    }

    /// The `k` words whose composites are most cosine-similar to `query`.
    pub fn nearest_to_vector(&self, query: &[f32], k: usize) -> Result<Vec<(String, f64)>> {
        self.ensure_trained()?;
        if query.len() != self.config.dim {
            return Err(EmbedError::DimensionMismatch {
                expected: self.config.dim,
                found: query.len(),
            });
        }
        Ok(self.rank_rows(query, &self.composites, None, k))
    }

    /// Cosine similarity between the composites of two words.
    pub fn similarity(&self, word1: &str, word2: &str) -> Result<f64> {
        let a = self.vector(word1)?;
        let b = self.vector(word2)?;
        Ok(self.space.similarity(a, b))
    }

    /// Ranks the base vectors of the whole vocabulary against `query`.
    ///
    /// `pinned` is ranked on its raw score and only raised to 1.0 if it makes
    /// the top `k`.
    pub(crate) fn rank_base_vectors(&self, query: &[f32], pinned: Option<usize>, k: usize) -> Vec<(String, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let base = self.space.base_table(self.vocab.words());
        let mut hits = crate::similarity::rank(self.search.score_all(query, &base), k);
        if let Some(hit) = pinned.and_then(|p| hits.iter_mut().find(|hit| hit.index == p)) {
            hit.score = 1.0;
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        self.named(hits)
    }

    /// Saves the trained table.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.ensure_trained()?;
        let meta = TableMeta {
            config: self.config.clone(),
            relations: self.relations.iter().cloned().collect(),
        };
        TableFormat::write(path, E::KIND, &meta, self.vocab.words(), &self.composites)?;
        info!("Saved {} model with {} words", E::KIND, self.vocab.len());
        Ok(())
    }

    /// Loads a table saved by [`save`](Self::save) as a trained model.
    ///
    /// Base and role vectors are regenerated from the stored seed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let table = TableFormat::read(path)?;
        if table.header.kind != E::KIND {
            return Err(EmbedError::InvalidFormat(format!(
                "expected a {} model, found {}",
                E::KIND,
                table.header.kind
            )));
        }
        if table.meta.config.seed.is_none() {
            return Err(EmbedError::InvalidFormat("missing seed".to_string()));
        }

        let vocab = Vocabulary::from_words(table.words.iter().cloned());
        if vocab.len() != table.words.len() {
            return Err(EmbedError::InvalidFormat("duplicate or empty words".to_string()));
        }

        let mut model = Self::new(vocab, table.meta.config)?;
        model.composites = table.vectors;
        model.relations = table.meta.relations.into_iter().collect();
        model.state = ModelState::Trained;
        info!("Loaded {} model with {} words", E::KIND, model.vocab.len());
        Ok(model)
    }
}

impl<E: Encoder> fmt::Debug for EmbeddingModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingModel")
            .field("kind", &E::KIND)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("vocab_size", &self.vocab.len())
            .finish()
    }
}
