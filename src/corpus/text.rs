//! Plain-text corpus: one sentence per line.

use crate::config::TextConfig;
use crate::corpus::{Corpus, Sentence};
use crate::error::Result;
use crate::text::Tokenizer;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reads sentences lazily from a text file, one per line.
///
/// Lines that tokenize to nothing are skipped.
#[derive(Debug, Clone)]
pub struct TextCorpus {
    path: PathBuf,
    tokenizer: Tokenizer,
}

impl TextCorpus {
    /// Creates a corpus over the file at `path`.
    pub fn new<P: AsRef<Path>>(path: P, config: TextConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tokenizer: Tokenizer::new(config),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Corpus for TextCorpus {
    type Unit = Sentence;

    fn units(&self) -> Result<Box<dyn Iterator<Item = Result<Sentence>> + '_>> {
        let reader = BufReader::new(File::open(&self.path)?);

        let iter = reader.lines().filter_map(move |line| match line {
            Ok(line) => {
                let tokens = self.tokenizer.tokenize(&line);
                (!tokens.is_empty()).then_some(Ok(tokens))
            }
            Err(e) => Some(Err(e.into())),
        });

        Ok(Box::new(iter))
    }
}
