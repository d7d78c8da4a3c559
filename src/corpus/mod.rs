//! Corpus sources.
//!
//! A corpus is a lazy, restartable stream of units: each call to
//! [`Corpus::units`] starts a fresh pass, so training can run several epochs
//! without materializing the corpus in memory.
//!
//! - [`VecCorpus`]: in-memory units
//! - [`TextCorpus`]: one sentence per line of a text file
//! - [`ConllCorpus`]: CoNLL-U dependency trees

mod conll;
mod text;

pub use conll::ConllCorpus;
pub use text::TextCorpus;

use crate::error::Result;

/// A tokenized sentence.
pub type Sentence = Vec<String>;

/// A head → dependent arc labelled with a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Token position of the head.
    pub head: usize,
    /// Token position of the dependent.
    pub dependent: usize,
    /// Relation label, e.g. `nsubj` or `dobj`.
    pub relation: String,
}

impl DependencyEdge {
    /// Creates an edge.
    pub fn new(head: usize, dependent: usize, relation: impl Into<String>) -> Self {
        Self {
            head,
            dependent,
            relation: relation.into(),
        }
    }
}

/// A sentence with its dependency arcs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree {
    /// Tokens in sentence order.
    pub tokens: Vec<String>,
    /// Arcs indexing into `tokens`.
    pub edges: Vec<DependencyEdge>,
}

impl DependencyTree {
    /// Creates a tree from tokens and arcs.
    pub fn new(tokens: Vec<String>, edges: Vec<DependencyEdge>) -> Self {
        Self { tokens, edges }
    }
}

/// A corpus unit made of symbols.
pub trait TokenSequence {
    /// The unit's tokens in order.
    fn tokens(&self) -> &[String];
}

impl TokenSequence for Sentence {
    fn tokens(&self) -> &[String] {
        self
    }
}

impl TokenSequence for DependencyTree {
    fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// A restartable stream of corpus units.
pub trait Corpus {
    /// The unit type: [`Sentence`] or [`DependencyTree`].
    type Unit: TokenSequence + Send + Sync;

    /// Starts a new pass over the corpus.
    ///
    /// An `Err` item means the source cannot continue; training stops with it.
    fn units(&self) -> Result<Box<dyn Iterator<Item = Result<Self::Unit>> + '_>>;
}

/// In-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct VecCorpus<U> {
    units: Vec<U>,
}

impl<U> VecCorpus<U> {
    /// Wraps the given units.
    pub fn new(units: Vec<U>) -> Self {
        Self { units }
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the corpus has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl VecCorpus<Sentence> {
    /// Builds sentences by splitting each string on whitespace.
    pub fn from_sentences<S: AsRef<str>>(sentences: &[S]) -> Self {
        Self::new(
            sentences
                .iter()
                .map(|s| s.as_ref().split_whitespace().map(str::to_string).collect())
                .collect(),
        )
    }
}

impl<U> Corpus for VecCorpus<U>
where
    U: TokenSequence + Clone + Send + Sync,
{
    type Unit = U;

    fn units(&self) -> Result<Box<dyn Iterator<Item = Result<U>> + '_>> {
        Ok(Box::new(self.units.iter().cloned().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_corpus_restartable() {
        let corpus = VecCorpus::from_sentences(&["cat runs", "dog barks"]);
        assert_eq!(corpus.len(), 2);

        for _ in 0..2 {
            let units: Vec<Sentence> = corpus.units().unwrap().map(|u| u.unwrap()).collect();
            assert_eq!(units[0], vec!["cat", "runs"]);
            assert_eq!(units[1], vec!["dog", "barks"]);
        }
    }

    #[test]
    fn test_tree_tokens() {
        let tree = DependencyTree::new(
            vec!["dog".into(), "barks".into()],
            vec![DependencyEdge::new(1, 0, "nsubj")],
        );
        assert_eq!(tree.tokens(), &["dog".to_string(), "barks".to_string()]);
    }
}
