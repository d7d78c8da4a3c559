//! Order-model queries: completions and resonance.

use crate::error::{EmbedError, Result};
use crate::hrr::{superpose_weighted, unbind};
use crate::model::OrderModel;
use log::debug;

/// Placeholder token marking the slot to fill in a resonance phrase.
pub const BLANK: &str = "_";

/// How per-word estimates are combined in [`OrderModel::get_resonants_weighted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResonanceWeighting {
    /// Plain superposition.
    #[default]
    Uniform,
    /// Each estimate weighted by 1 / |offset from the blank|.
    InverseDistance,
}

impl OrderModel {
    fn check_offset(&self, position: isize) -> Result<()> {
        let window = self.config.window as isize;
        if position == 0 || position.abs() > window {
            return Err(EmbedError::InvalidQuery(format!(
                "position {position} is outside the window ±{window}"
            )));
        }
        Ok(())
    }

    /// Words most likely to appear `position` slots away from `word`
    /// (negative: before it).
    ///
    /// The composite of `word` is unbound with the position vector and the
    /// estimate ranked against every base vector. `word` itself competes on
    /// its raw score and is reported as 1.0 only if it makes the top `k`.
    pub fn get_completions(&self, word: &str, position: isize, k: usize) -> Result<Vec<(String, f64)>> {
        self.ensure_trained()?;
        let idx = self.index_of(word)?;
        self.check_offset(position)?;

        let role = self.space.position_vector(position);
        let estimate = unbind(&self.composites[idx], &role);
        Ok(self.rank_base_vectors(&estimate, Some(idx), k))
    }

    /// Words that fit the blank (`_`) in `phrase`, e.g. `"the _ ruled"`.
    pub fn get_resonants(&self, phrase: &str, k: usize) -> Result<Vec<(String, f64)>> {
        self.get_resonants_weighted(phrase, k, ResonanceWeighting::Uniform)
    }

    /// Words that fit the blank in `phrase`, combining the per-word
    /// estimates with `weighting`.
    ///
    /// Each context word within the window of the blank contributes the
    /// unbinding of its composite with the position of the blank relative
    /// to it. Context words outside the window are ignored.
    pub fn get_resonants_weighted(
        &self,
        phrase: &str,
        k: usize,
        weighting: ResonanceWeighting,
    ) -> Result<Vec<(String, f64)>> {
        self.ensure_trained()?;

        let tokens: Vec<&str> = phrase.split_whitespace().collect();
        let blanks: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == BLANK)
            .map(|(i, _)| i)
            .collect();
        let blank = match blanks.as_slice() {
            [b] => *b,
            _ => {
                return Err(EmbedError::InvalidQuery(format!(
                    "phrase must contain exactly one '{BLANK}', found {}",
                    blanks.len()
                )))
            }
        };

        let window = self.config.window as isize;
        let mut estimates = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if i == blank {
                continue;
            }
            let idx = self.index_of(token)?;
            // offset of the blank as seen from this word
            let offset = blank as isize - i as isize;
            if offset.abs() > window {
                debug!("Resonance: '{}' is outside the window of the blank", token);
                continue;
            }

            let weight = match weighting {
                ResonanceWeighting::Uniform => 1.0,
                ResonanceWeighting::InverseDistance => 1.0 / offset.unsigned_abs() as f32,
            };
            let role = self.space.position_vector(offset);
            estimates.push((unbind(&self.composites[idx], &role), weight));
        }

        if estimates.is_empty() {
            return Err(EmbedError::InvalidQuery(
                "no context word within the window of the blank".to_string(),
            ));
        }

        let combined = superpose_weighted(&estimates);
        Ok(self.rank_base_vectors(&combined, None, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::corpus::VecCorpus;
    use crate::vocab::Vocabulary;

    const FILLER: [&str; 5] = ["apple", "river", "stone", "cloud", "green"];

    fn king_model(config: EmbeddingConfig) -> OrderModel {
        let mut words = vec!["the", "king", "ruled"];
        words.extend(FILLER);
        let vocab = Vocabulary::from_words(words);
        let corpus = VecCorpus::from_sentences(&["the king ruled"; 10]);

        let mut model = OrderModel::new(vocab, config).unwrap();
        model.train(&corpus).unwrap();
        model
    }

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            dim: 256,
            window: 2,
            seed: Some(2024),
            ..Default::default()
        }
    }

    fn score(results: &[(String, f64)], word: &str) -> f64 {
        results.iter().find(|(w, _)| w == word).map(|(_, s)| *s).unwrap()
    }

    #[test]
    fn test_completions_rank_king_after_the() {
        let model = king_model(config());
        let results = model.get_completions("the", 1, 8).unwrap();

        assert_eq!(results[0], ("the".to_string(), 1.0));
        assert_eq!(results[1].0, "king");
        for filler in FILLER {
            assert!(score(&results, "king") > score(&results, filler));
        }
    }

    #[test]
    fn test_completions_self_only_when_it_makes_the_cut() {
        let model = king_model(config());
        let top = model.get_completions("the", 1, 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "king");
        assert!(top[0].1 < 1.0);

        let all = model.get_completions("the", 1, 8).unwrap();
        assert_eq!(all[0], ("the".to_string(), 1.0));
    }

    #[test]
    fn test_completions_before_word() {
        let model = king_model(config());
        let results = model.get_completions("ruled", -1, 8).unwrap();
        assert_eq!(results[1].0, "king");
    }

    #[test]
    fn test_completions_reject_bad_position() {
        let model = king_model(config());
        assert!(matches!(model.get_completions("the", 0, 5), Err(EmbedError::InvalidQuery(_))));
        assert!(matches!(model.get_completions("the", 3, 5), Err(EmbedError::InvalidQuery(_))));
        assert!(matches!(model.get_completions("queen", 1, 5), Err(EmbedError::UnknownSymbol(_))));
    }

    #[test]
    fn test_resonants_fill_blank() {
        let model = king_model(config());
        let uniform = model.get_resonants("the _ ruled", 3).unwrap();
        assert_eq!(uniform[0].0, "king");

        let weighted = model
            .get_resonants_weighted("the _ ruled", 3, ResonanceWeighting::InverseDistance)
            .unwrap();
        assert_eq!(weighted[0].0, "king");
    }

    #[test]
    fn test_resonants_with_unitary_roles() {
        let model = king_model(EmbeddingConfig {
            unitary_roles: true,
            ..config()
        });
        let results = model.get_resonants("the king _", 1).unwrap();
        assert_eq!(results[0].0, "ruled");
    }

    #[test]
    fn test_resonants_invalid_phrases() {
        let model = king_model(config());
        assert!(matches!(model.get_resonants("the king ruled", 3), Err(EmbedError::InvalidQuery(_))));
        assert!(matches!(model.get_resonants("_ _ ruled", 3), Err(EmbedError::InvalidQuery(_))));
        assert!(matches!(model.get_resonants("", 3), Err(EmbedError::InvalidQuery(_))));
        assert!(matches!(model.get_resonants("_ queen", 3), Err(EmbedError::UnknownSymbol(_))));
    }
}
