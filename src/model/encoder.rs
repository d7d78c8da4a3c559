//! Encoding strategies: how one corpus unit turns into composite updates.
//!
//! The training loop is shared; each model variant only differs in the
//! [`Encoder`] it plugs in.

use crate::config::EmbeddingConfig;
use crate::corpus::{DependencyTree, Sentence, TokenSequence};
use crate::hrr::{add_scaled, bind_into, Vector, VectorSpace};
use crate::model::accumulator::Update;
use crate::model::ModelKind;
use crate::vocab::Vocabulary;
use std::sync::Arc;

/// Read-only state shared by all workers during training.
pub struct EncodeContext<'a> {
    /// Model vocabulary.
    pub vocab: &'a Vocabulary,
    /// Base and role vectors.
    pub space: &'a VectorSpace,
    /// Base vectors by vocabulary index.
    pub base: &'a [Arc<[f32]>],
}

impl EncodeContext<'_> {
    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.space.dim()
    }

    /// Vocabulary index per token; `None` for unknown tokens, which keep
    /// their slot so offsets stay measured in the input sentence.
    pub fn resolve(&self, tokens: &[String]) -> Vec<Option<usize>> {
        tokens.iter().map(|t| self.vocab.index_of(t)).collect()
    }
}

/// Updates produced from one corpus unit.
#[derive(Debug, Default)]
pub struct Encoded {
    /// Composite updates, in token order.
    pub updates: Vec<Update>,
    /// Tokens missing from the vocabulary.
    pub skipped_tokens: usize,
    /// Dependency edges pointing outside the sentence.
    pub skipped_edges: usize,
}

/// A variant-specific encoding scheme.
pub trait Encoder: Send + Sync {
    /// Corpus unit this encoder consumes.
    type Unit: TokenSequence + Send + Sync;

    /// Model variant tag, persisted with trained tables.
    const KIND: ModelKind;

    /// Builds the encoder from the model configuration.
    fn from_config(config: &EmbeddingConfig) -> Self;

    /// Called once before training with the model's vector space.
    fn prepare(&mut self, _space: &VectorSpace) {}

    /// Computes the composite updates for one unit. Pure: no shared writes.
    fn encode(&self, unit: &Self::Unit, ctx: &EncodeContext<'_>) -> Encoded;
}

/// Positions within `window` of `p` in a sentence of length `len`,
/// excluding `p`, as `(offset, position)` pairs.
fn window_positions(len: usize, p: usize, window: usize) -> impl Iterator<Item = (isize, usize)> {
    let start = p.saturating_sub(window);
    let end = (p + window + 1).min(len);
    (start..end)
        .filter(move |&q| q != p)
        .map(move |q| (q as isize - p as isize, q))
}

fn count_unknown(tokens: &[String], ids: &[Option<usize>]) -> usize {
    tokens
        .iter()
        .zip(ids)
        .filter(|(t, id)| id.is_none() && !t.is_empty())
        .count()
}

/// Random indexing: a word's composite is the sum of the base vectors of
/// the words around it.
#[derive(Debug, Clone)]
pub struct ContextEncoder {
    window: usize,
}

impl Encoder for ContextEncoder {
    type Unit = Sentence;
    const KIND: ModelKind = ModelKind::Context;

    fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            window: config.window,
        }
    }

    fn encode(&self, unit: &Sentence, ctx: &EncodeContext<'_>) -> Encoded {
        let ids = ctx.resolve(unit);
        let mut encoded = Encoded {
            skipped_tokens: count_unknown(unit, &ids),
            ..Default::default()
        };

        for (p, target) in ids.iter().enumerate() {
            let Some(target) = *target else { continue };

            let mut contribution: Vector = vec![0.0; ctx.dim()];
            let mut observed = false;
            for (_, q) in window_positions(ids.len(), p, self.window) {
                if let Some(s) = ids[q] {
                    add_scaled(&mut contribution, &ctx.base[s], 1.0);
                    observed = true;
                }
            }

            if observed {
                encoded.updates.push(Update::new(target, contribution, 1.0));
            }
        }

        encoded
    }
}

/// Word order: each neighbour is bound to the position vector of its
/// offset before superposition, so the composite remembers where context
/// words occurred.
#[derive(Debug, Clone)]
pub struct OrderEncoder {
    window: usize,
    positions: Vec<(isize, Arc<[f32]>)>,
}

impl OrderEncoder {
    fn position(&self, offset: isize, ctx: &EncodeContext<'_>) -> Arc<[f32]> {
        self.positions
            .iter()
            .find(|(o, _)| *o == offset)
            .map(|(_, v)| Arc::clone(v))
            .unwrap_or_else(|| ctx.space.position_vector(offset))
    }
}

impl Encoder for OrderEncoder {
    type Unit = Sentence;
    const KIND: ModelKind = ModelKind::Order;

    fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            window: config.window,
            positions: Vec::new(),
        }
    }

    fn prepare(&mut self, space: &VectorSpace) {
        let w = self.window as isize;
        self.positions = (-w..=w)
            .filter(|&o| o != 0)
            .map(|o| (o, space.position_vector(o)))
            .collect();
    }

    fn encode(&self, unit: &Sentence, ctx: &EncodeContext<'_>) -> Encoded {
        let ids = ctx.resolve(unit);
        let mut encoded = Encoded {
            skipped_tokens: count_unknown(unit, &ids),
            ..Default::default()
        };

        for (p, target) in ids.iter().enumerate() {
            let Some(target) = *target else { continue };

            let mut contribution: Vector = vec![0.0; ctx.dim()];
            let mut observed = false;
            for (offset, q) in window_positions(ids.len(), p, self.window) {
                if let Some(s) = ids[q] {
                    let role = self.position(offset, ctx);
                    bind_into(&mut contribution, &role, &ctx.base[s]);
                    observed = true;
                }
            }

            if observed {
                encoded.updates.push(Update::new(target, contribution, 1.0));
            }
        }

        encoded
    }
}

/// Dependency structure: for every arc touching a word, the word at the
/// other end is bound to the relation's role vector. Both endpoints receive
/// a contribution under the same role.
#[derive(Debug, Clone, Default)]
pub struct SyntaxEncoder;

impl Encoder for SyntaxEncoder {
    type Unit = DependencyTree;
    const KIND: ModelKind = ModelKind::Syntax;

    fn from_config(_config: &EmbeddingConfig) -> Self {
        Self
    }

    fn encode(&self, unit: &DependencyTree, ctx: &EncodeContext<'_>) -> Encoded {
        let n = unit.tokens.len();
        let ids = ctx.resolve(&unit.tokens);
        let mut encoded = Encoded {
            skipped_tokens: count_unknown(&unit.tokens, &ids),
            ..Default::default()
        };

        let mut contributions: Vec<Option<Vector>> = vec![None; n];
        for edge in &unit.edges {
            if edge.head >= n || edge.dependent >= n || edge.head == edge.dependent {
                encoded.skipped_edges += 1;
                continue;
            }

            let role = ctx.space.relation_vector(&edge.relation);
            for (target, other) in [(edge.head, edge.dependent), (edge.dependent, edge.head)] {
                if let (Some(_), Some(o)) = (ids[target], ids[other]) {
                    let acc = contributions[target].get_or_insert_with(|| vec![0.0; ctx.dim()]);
                    bind_into(acc, &role, &ctx.base[o]);
                }
            }
        }

        for (pos, contribution) in contributions.into_iter().enumerate() {
            if let (Some(target), Some(contribution)) = (ids[pos], contribution) {
                encoded.updates.push(Update::new(target, contribution, 1.0));
            }
        }

        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DependencyEdge;
    use crate::hrr::{bind, cosine_similarity, unbind};

    struct Fixture {
        vocab: Vocabulary,
        space: VectorSpace,
        base: Vec<Arc<[f32]>>,
    }

    impl Fixture {
        fn new(words: &[&str]) -> Self {
            let vocab = Vocabulary::from_words(words.iter().copied());
            let space = VectorSpace::new(256, 17, false);
            let base = space.base_table(vocab.words());
            Self { vocab, space, base }
        }

        fn ctx(&self) -> EncodeContext<'_> {
            EncodeContext {
                vocab: &self.vocab,
                space: &self.space,
                base: &self.base,
            }
        }
    }

    fn sentence(s: &str) -> Sentence {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn config(window: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            dim: 256,
            window,
            ..Default::default()
        }
    }

    #[test]
    fn test_window_positions() {
        let got: Vec<(isize, usize)> = window_positions(5, 0, 2).collect();
        assert_eq!(got, vec![(1, 1), (2, 2)]);
        let got: Vec<(isize, usize)> = window_positions(5, 2, 1).collect();
        assert_eq!(got, vec![(-1, 1), (1, 3)]);
        assert_eq!(window_positions(1, 0, 3).count(), 0);
    }

    #[test]
    fn test_context_encoder_sums_neighbours() {
        let fx = Fixture::new(&["cat", "runs", "fast"]);
        let encoder = ContextEncoder::from_config(&config(1));
        let encoded = encoder.encode(&sentence("cat runs fast"), &fx.ctx());

        assert_eq!(encoded.updates.len(), 3);
        let runs = &encoded.updates[1];
        assert_eq!(runs.symbol, 1);
        for (i, x) in runs.contribution.iter().enumerate() {
            assert!((x - (fx.base[0][i] + fx.base[2][i])).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unknown_tokens_keep_slot() {
        let fx = Fixture::new(&["cat", "fast"]);
        let encoder = ContextEncoder::from_config(&config(1));
        let encoded = encoder.encode(&sentence("cat runs fast"), &fx.ctx());

        // "runs" is unknown: it separates cat and fast, so neither sees the other
        assert!(encoded.updates.is_empty());
        assert_eq!(encoded.skipped_tokens, 1);
    }

    #[test]
    fn test_order_encoder_binds_positions() {
        let fx = Fixture::new(&["the", "king"]);
        let mut encoder = OrderEncoder::from_config(&config(2));
        encoder.prepare(&fx.space);
        let encoded = encoder.encode(&sentence("the king"), &fx.ctx());

        let the = &encoded.updates[0];
        let expected = bind(&fx.space.position_vector(1), &fx.base[1]);
        for (x, e) in the.contribution.iter().zip(&expected) {
            assert!((x - e).abs() < 1e-5);
        }

        let estimate = unbind(&the.contribution, &fx.space.position_vector(1));
        assert!(cosine_similarity(&estimate, &fx.base[1]) > 0.4);
    }

    #[test]
    fn test_syntax_encoder_both_endpoints() {
        let fx = Fixture::new(&["dog", "barks"]);
        let encoder = SyntaxEncoder::from_config(&config(2));
        let tree = DependencyTree::new(sentence("dog barks"), vec![DependencyEdge::new(1, 0, "nsubj")]);
        let encoded = encoder.encode(&tree, &fx.ctx());

        assert_eq!(encoded.updates.len(), 2);
        let role = fx.space.relation_vector("nsubj");
        let barks = encoded.updates.iter().find(|u| u.symbol == 1).unwrap();
        let estimate = unbind(&barks.contribution, &role);
        assert!(cosine_similarity(&estimate, &fx.base[0]) > 0.4);
    }

    #[test]
    fn test_syntax_encoder_skips_malformed_edges() {
        let fx = Fixture::new(&["dog", "barks"]);
        let encoder = SyntaxEncoder::from_config(&config(2));
        let tree = DependencyTree::new(
            sentence("dog barks"),
            vec![DependencyEdge::new(5, 0, "nsubj"), DependencyEdge::new(1, 1, "dep")],
        );
        let encoded = encoder.encode(&tree, &fx.ctx());

        assert!(encoded.updates.is_empty());
        assert_eq!(encoded.skipped_edges, 2);
    }
}
