//! Syntax-model queries: relation neighbours.

use crate::error::{EmbedError, Result};
use crate::hrr::unbind;
use crate::model::SyntaxModel;

impl SyntaxModel {
    /// Relation labels seen during training, sorted.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.relations.iter().map(String::as_str)
    }

    /// Words most likely to stand in `relation` to `word`, e.g. the
    /// subjects (`nsubj`) or objects (`dobj`) of a verb.
    ///
    /// The composite of `word` is unbound with the relation's role vector
    /// and the estimate ranked against every base vector.
    pub fn get_verb_neighbors(&self, word: &str, relation: &str, k: usize) -> Result<Vec<(String, f64)>> {
        self.ensure_trained()?;
        let idx = self.index_of(word)?;
        if !self.relations.contains(relation) {
            return Err(EmbedError::UnknownRelation(relation.to_string()));
        }

        let role = self.space.relation_vector(relation);
        let estimate = unbind(&self.composites[idx], &role);
        Ok(self.rank_base_vectors(&estimate, None, k))
    }
}
