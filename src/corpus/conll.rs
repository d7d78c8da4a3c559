//! CoNLL-U dependency corpus.
//!
//! Sentences are blocks of tab-separated token lines separated by blank
//! lines; `#` lines are comments. Only the ID, FORM, LEMMA, HEAD and DEPREL
//! columns are used. Multiword ranges (`1-2`) and empty nodes (`1.1`) are
//! ignored; malformed lines and dangling heads are skipped with a warning.

use crate::config::TextConfig;
use crate::corpus::{Corpus, DependencyEdge, DependencyTree};
use crate::error::Result;
use crate::text::Normalizer;
use log::warn;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

const COL_ID: usize = 0;
const COL_FORM: usize = 1;
const COL_LEMMA: usize = 2;
const COL_HEAD: usize = 6;
const COL_DEPREL: usize = 7;
const MIN_COLUMNS: usize = 8;

/// Reads dependency trees lazily from a CoNLL-U file.
#[derive(Debug, Clone)]
pub struct ConllCorpus {
    path: PathBuf,
    normalizer: Normalizer,
    use_lemmas: bool,
}

impl ConllCorpus {
    /// Creates a corpus over the file at `path`.
    pub fn new<P: AsRef<Path>>(path: P, config: TextConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            normalizer: Normalizer::new(config),
            use_lemmas: false,
        }
    }

    /// Use the LEMMA column instead of FORM (falls back to FORM for `_`).
    pub fn with_lemmas(mut self, use_lemmas: bool) -> Self {
        self.use_lemmas = use_lemmas;
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Corpus for ConllCorpus {
    type Unit = DependencyTree;

    fn units(&self) -> Result<Box<dyn Iterator<Item = Result<DependencyTree>> + '_>> {
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(Box::new(ConllTrees {
            lines: reader.lines(),
            normalizer: &self.normalizer,
            use_lemmas: self.use_lemmas,
            line_no: 0,
        }))
    }
}

struct Row {
    id: usize,
    token: String,
    head: usize,
    relation: String,
}

struct ConllTrees<'a, R> {
    lines: Lines<R>,
    normalizer: &'a Normalizer,
    use_lemmas: bool,
    line_no: usize,
}

impl<R: BufRead> ConllTrees<'_, R> {
    fn parse_row(&self, line: &str) -> Option<Row> {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < MIN_COLUMNS {
            warn!("CoNLL line {}: expected {} columns, found {}", self.line_no, MIN_COLUMNS, cols.len());
            return None;
        }

        let id_field = cols[COL_ID];
        if id_field.contains('-') || id_field.contains('.') {
            return None;
        }

        let (id, head) = match (id_field.parse::<usize>(), cols[COL_HEAD].parse::<usize>()) {
            (Ok(id), Ok(head)) if id > 0 => (id, head),
            _ => {
                warn!("CoNLL line {}: bad ID or HEAD column", self.line_no);
                return None;
            }
        };

        let raw = if self.use_lemmas && cols[COL_LEMMA] != "_" {
            cols[COL_LEMMA]
        } else {
            cols[COL_FORM]
        };

        Some(Row {
            id,
            token: self.normalizer.normalize_in_place(raw),
            head,
            relation: cols[COL_DEPREL].to_string(),
        })
    }

    fn build_tree(rows: Vec<Row>) -> DependencyTree {
        let positions: HashMap<usize, usize> =
            rows.iter().enumerate().map(|(pos, row)| (row.id, pos)).collect();

        let mut edges = Vec::new();
        for (dependent, row) in rows.iter().enumerate() {
            if row.head == 0 {
                continue;
            }
            match positions.get(&row.head) {
                Some(&head) => edges.push(DependencyEdge::new(head, dependent, row.relation.clone())),
                None => warn!("CoNLL token {} has dangling head {}", row.id, row.head),
            }
        }

        DependencyTree::new(rows.into_iter().map(|r| r.token).collect(), edges)
    }
}

impl<R: BufRead> Iterator for ConllTrees<'_, R> {
    type Item = Result<DependencyTree>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = Vec::new();

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(e.into())),
                None => break,
            };
            self.line_no += 1;

            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                if rows.is_empty() {
                    continue;
                }
                break;
            }
            if trimmed.starts_with('#') {
                continue;
            }
            if let Some(row) = self.parse_row(trimmed) {
                rows.push(row);
            }
        }

        if rows.is_empty() {
            None
        } else {
            Some(Ok(Self::build_tree(rows)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# sent_id = 1
1\tThe\tthe\tDET\t_\t_\t2\tdet\t_\t_
2\tdog\tdog\tNOUN\t_\t_\t3\tnsubj\t_\t_
3\tchased\tchase\tVERB\t_\t_\t0\troot\t_\t_
4\tcats\tcat\tNOUN\t_\t_\t3\tdobj\t_\t_

1\tCats\tcat\tNOUN\t_\t_\t2\tnsubj\t_\t_
2-3\tdon't\t_\t_\t_\t_\t_\t_\t_\t_
2\tsleep\tsleep\tVERB\t_\t_\t0\troot\t_\t_
broken line
";

    fn write_sample() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_trees() {
        let file = write_sample();
        let corpus = ConllCorpus::new(file.path(), TextConfig::default());
        let trees: Vec<DependencyTree> = corpus.units().unwrap().map(|t| t.unwrap()).collect();

        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].tokens, vec!["the", "dog", "chased", "cats"]);
        assert_eq!(trees[0].edges.len(), 3);
        assert!(trees[0].edges.contains(&DependencyEdge::new(2, 1, "nsubj")));
        assert!(trees[0].edges.contains(&DependencyEdge::new(2, 3, "dobj")));

        // multiword range and broken line are skipped
        assert_eq!(trees[1].tokens, vec!["cats", "sleep"]);
        assert_eq!(trees[1].edges, vec![DependencyEdge::new(1, 0, "nsubj")]);
    }

    #[test]
    fn test_lemmas() {
        let file = write_sample();
        let corpus = ConllCorpus::new(file.path(), TextConfig::default()).with_lemmas(true);
        let first = corpus.units().unwrap().next().unwrap().unwrap();
        assert_eq!(first.tokens, vec!["the", "dog", "chase", "cat"]);
    }

    #[test]
    fn test_restartable() {
        let file = write_sample();
        let corpus = ConllCorpus::new(file.path(), TextConfig::default());
        assert_eq!(corpus.units().unwrap().count(), 2);
        assert_eq!(corpus.units().unwrap().count(), 2);
    }
}
