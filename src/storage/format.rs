//! Binary format for trained vector tables.
//!
//! The layout is flat and keyed by vocabulary index, so row `i` of the
//! vector section is the composite of word `i`.
//!
//! ## Format Layout
//!
//! ```text
//! +------------------+
//! | Header (64 bytes)|
//! +------------------+
//! | Metadata         |  bincode: model config and relation labels
//! +------------------+
//! | Word Index Table |  num_words × (string_offset: u32, string_len: u32)
//! +------------------+
//! | Vector Data      |  num_words × dim × f32, row-major, little-endian
//! +------------------+
//! | String Pool      |  concatenated UTF-8 words
//! +------------------+
//! ```
//!
//! ### Header (64 bytes)
//! - Magic number (4 bytes): "HRRV"
//! - Version (2 bytes)
//! - Model kind (2 bytes): 0 = context, 1 = order, 2 = syntax
//! - Dimension (4 bytes)
//! - Number of words (4 bytes)
//! - Metadata offset (8 bytes)
//! - Index table offset (8 bytes)
//! - Vector data offset (8 bytes)
//! - String pool offset (8 bytes)
//! - Total file length (8 bytes)
//! - Reserved (8 bytes)

use crate::config::EmbeddingConfig;
use crate::error::{EmbedError, Result};
use crate::hrr::Vector;
use crate::model::ModelKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Magic number for vector table files.
const MAGIC: &[u8; 4] = b"HRRV";

/// Current format version.
const VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Vector table file header.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    /// Format version.
    pub version: u16,
    /// Model variant the table was trained with.
    pub kind: ModelKind,
    /// Vector dimensionality.
    pub dim: u32,
    /// Number of words.
    pub num_words: u32,
    /// Offset to the metadata section.
    pub meta_offset: u64,
    /// Offset to the index table.
    pub index_offset: u64,
    /// Offset to vector data.
    pub vectors_offset: u64,
    /// Offset to the string pool.
    pub string_pool_offset: u64,
    /// Total file length.
    pub file_len: u64,
}

impl TableHeader {
    /// Writes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.kind.as_u16().to_le_bytes());
        bytes[8..12].copy_from_slice(&self.dim.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.num_words.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.meta_offset.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.index_offset.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.vectors_offset.to_le_bytes());
        bytes[40..48].copy_from_slice(&self.string_pool_offset.to_le_bytes());
        bytes[48..56].copy_from_slice(&self.file_len.to_le_bytes());
        // Reserved (bytes 56-63)
        bytes
    }

    /// Reads a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(EmbedError::InvalidFormat("Header too short".to_string()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(EmbedError::InvalidFormat("Invalid magic number".to_string()));
        }

        let version = read_u16(bytes, 4);
        if version != VERSION {
            return Err(EmbedError::InvalidFormat(format!(
                "Unsupported version {version}"
            )));
        }
        let kind_tag = read_u16(bytes, 6);
        let kind = ModelKind::from_u16(kind_tag)
            .ok_or_else(|| EmbedError::InvalidFormat(format!("Unknown model kind {kind_tag}")))?;

        let header = Self {
            version,
            kind,
            dim: read_u32(bytes, 8),
            num_words: read_u32(bytes, 12),
            meta_offset: read_u64(bytes, 16),
            index_offset: read_u64(bytes, 24),
            vectors_offset: read_u64(bytes, 32),
            string_pool_offset: read_u64(bytes, 40),
            file_len: read_u64(bytes, 48),
        };

        let ordered = HEADER_SIZE as u64 <= header.meta_offset
            && header.meta_offset <= header.index_offset
            && header.index_offset <= header.vectors_offset
            && header.vectors_offset <= header.string_pool_offset
            && header.string_pool_offset <= header.file_len;
        if !ordered {
            return Err(EmbedError::InvalidFormat("Section offsets out of order".to_string()));
        }
        Ok(header)
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Model parameters stored alongside the vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Configuration the table was trained with; its seed regenerates the
    /// base and role vectors.
    pub config: EmbeddingConfig,
    /// Relation labels seen in training (Syntax models).
    pub relations: Vec<String>,
}

/// A vector table read back from disk.
#[derive(Debug, Clone)]
pub struct VectorTable {
    /// Parsed header.
    pub header: TableHeader,
    /// Stored metadata.
    pub meta: TableMeta,
    /// Words in vocabulary order.
    pub words: Vec<String>,
    /// Composite vectors, one per word.
    pub vectors: Vec<Vector>,
}

/// Index entry for a word.
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// Offset into the string pool.
    string_offset: u32,
    /// Length of the word string.
    string_len: u32,
}

impl IndexEntry {
    const SIZE: usize = 8;

    fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.string_offset.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.string_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            string_offset: read_u32(bytes, 0),
            string_len: read_u32(bytes, 4),
        }
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| EmbedError::InvalidFormat(format!("{what} exceeds u32")))
}

/// Binary format reader/writer for vector tables.
pub struct TableFormat;

impl TableFormat {
    /// Writes a trained table.
    pub fn write<P: AsRef<Path>>(
        path: P,
        kind: ModelKind,
        meta: &TableMeta,
        words: &[String],
        vectors: &[Vector],
    ) -> Result<()> {
        let dim = meta.config.dim;
        if words.len() != vectors.len() {
            return Err(EmbedError::InvalidFormat(format!(
                "{} words but {} vectors",
                words.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(EmbedError::DimensionMismatch {
                expected: dim,
                found: bad.len(),
            });
        }

        let meta_bytes = bincode::serialize(meta)?;

        let mut entries = Vec::with_capacity(words.len());
        let mut string_pool = Vec::new();
        for word in words {
            entries.push(IndexEntry {
                string_offset: to_u32(string_pool.len(), "String pool")?,
                string_len: to_u32(word.len(), "Word length")?,
            });
            string_pool.extend_from_slice(word.as_bytes());
        }

        let meta_offset = HEADER_SIZE as u64;
        let index_offset = meta_offset + meta_bytes.len() as u64;
        let vectors_offset = index_offset + (entries.len() * IndexEntry::SIZE) as u64;
        let string_pool_offset = vectors_offset + (words.len() * dim * 4) as u64;
        let header = TableHeader {
            version: VERSION,
            kind,
            dim: to_u32(dim, "Dimension")?,
            num_words: to_u32(words.len(), "Word count")?,
            meta_offset,
            index_offset,
            vectors_offset,
            string_pool_offset,
            file_len: string_pool_offset + string_pool.len() as u64,
        };

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&header.to_bytes())?;
        writer.write_all(&meta_bytes)?;
        for entry in &entries {
            writer.write_all(&entry.to_bytes())?;
        }
        for row in vectors {
            for x in row {
                writer.write_all(&x.to_le_bytes())?;
            }
        }
        writer.write_all(&string_pool)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads only the header.
    pub fn read_header<P: AsRef<Path>>(path: P) -> Result<TableHeader> {
        let mut file = File::open(path)?;
        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes)
            .map_err(|_| EmbedError::InvalidFormat("Header too short".to_string()))?;
        TableHeader::from_bytes(&header_bytes)
    }

    /// Reads a complete table.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<VectorTable> {
        let mut file = File::open(path)?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes)
            .map_err(|_| EmbedError::InvalidFormat("Header too short".to_string()))?;
        let header = TableHeader::from_bytes(&header_bytes)?;

        let actual_len = file.seek(SeekFrom::End(0))?;
        if actual_len < header.file_len {
            return Err(EmbedError::InvalidFormat(format!(
                "Truncated file: expected {} bytes, found {}",
                header.file_len, actual_len
            )));
        }

        let num_words = header.num_words as usize;
        let dim = header.dim as usize;
        let (index_len, vectors_len) = section_sizes(&header)
            .ok_or_else(|| EmbedError::InvalidFormat("Section sizes overflow".to_string()))?;
        if header.vectors_offset - header.index_offset != index_len
            || header.string_pool_offset - header.vectors_offset != vectors_len
        {
            return Err(EmbedError::InvalidFormat("Section sizes do not match header".to_string()));
        }

        let meta_bytes = read_section(&mut file, header.meta_offset, header.index_offset)?;
        let meta: TableMeta = bincode::deserialize(&meta_bytes)?;
        if meta.config.dim != dim {
            return Err(EmbedError::DimensionMismatch {
                expected: dim,
                found: meta.config.dim,
            });
        }

        let index_bytes = read_section(&mut file, header.index_offset, header.vectors_offset)?;
        let vector_bytes = read_section(&mut file, header.vectors_offset, header.string_pool_offset)?;
        let string_pool = read_section(&mut file, header.string_pool_offset, header.file_len)?;

        let mut words = Vec::with_capacity(num_words);
        for chunk in index_bytes.chunks_exact(IndexEntry::SIZE) {
            let entry = IndexEntry::from_bytes(chunk);
            let start = entry.string_offset as usize;
            let end = start.saturating_add(entry.string_len as usize);
            let raw = string_pool
                .get(start..end)
                .ok_or_else(|| EmbedError::InvalidFormat("Word outside string pool".to_string()))?;
            let word = std::str::from_utf8(raw)
                .map_err(|e| EmbedError::InvalidFormat(format!("Invalid UTF-8 word: {e}")))?;
            words.push(word.to_string());
        }

        let vectors: Vec<Vector> = if dim == 0 {
            vec![Vec::new(); num_words]
        } else {
            vector_bytes
                .chunks_exact(dim * 4)
                .map(|row| {
                    row.chunks_exact(4)
                        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                        .collect()
                })
                .collect()
        };

        Ok(VectorTable {
            header,
            meta,
            words,
            vectors,
        })
    }
}

/// Expected byte lengths of the index and vector sections, or `None` if the
/// header's counts overflow.
fn section_sizes(header: &TableHeader) -> Option<(u64, u64)> {
    let num_words = u64::from(header.num_words);
    let index_len = num_words.checked_mul(IndexEntry::SIZE as u64)?;
    let vectors_len = num_words
        .checked_mul(u64::from(header.dim))?
        .checked_mul(std::mem::size_of::<f32>() as u64)?;
    Some((index_len, vectors_len))
}

fn read_section(file: &mut File, start: u64, end: u64) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(start))?;
    let mut buf = vec![0u8; (end - start) as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> (TableMeta, Vec<String>, Vec<Vector>) {
        let meta = TableMeta {
            config: EmbeddingConfig {
                dim: 3,
                seed: Some(42),
                ..Default::default()
            },
            relations: vec!["nsubj".to_string()],
        };
        let words = vec!["king".to_string(), "königin".to_string()];
        let vectors = vec![vec![1.0, -2.5, 0.0], vec![0.25, 0.5, 1e-7]];
        (meta, words, vectors)
    }

    #[test]
    fn test_header_roundtrip() {
        let header = TableHeader {
            version: VERSION,
            kind: ModelKind::Order,
            dim: 512,
            num_words: 1000,
            meta_offset: 64,
            index_offset: 128,
            vectors_offset: 8128,
            string_pool_offset: 2056128,
            file_len: 2060000,
        };
        let parsed = TableHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(
            TableHeader::from_bytes(&bytes),
            Err(EmbedError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.hrr");
        let (meta, words, vectors) = sample();

        TableFormat::write(&path, ModelKind::Syntax, &meta, &words, &vectors).unwrap();
        let table = TableFormat::read(&path).unwrap();

        assert_eq!(table.header.kind, ModelKind::Syntax);
        assert_eq!(table.header.dim, 3);
        assert_eq!(table.meta, meta);
        assert_eq!(table.words, words);
        assert_eq!(table.vectors, vectors);
        assert_eq!(TableFormat::read_header(&path).unwrap(), table.header);
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.hrr");
        let (meta, words, vectors) = sample();
        TableFormat::write(&path, ModelKind::Context, &meta, &words, &vectors).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();
        assert!(matches!(
            TableFormat::read(&path),
            Err(EmbedError::InvalidFormat(_))
        ));

        std::fs::write(&path, &bytes[..10]).unwrap();
        assert!(matches!(
            TableFormat::read(&path),
            Err(EmbedError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_corrupt_counts_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.hrr");
        let (meta, words, vectors) = sample();
        TableFormat::write(&path, ModelKind::Context, &meta, &words, &vectors).unwrap();
        let bytes = std::fs::read(&path).unwrap();

        // dim and num_words large enough to overflow the section sizes
        let mut corrupt = bytes.clone();
        corrupt[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        corrupt[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        std::fs::write(&path, &corrupt).unwrap();
        assert!(matches!(TableFormat::read(&path), Err(EmbedError::InvalidFormat(_))));

        // plausible but wrong dimension
        let mut corrupt = bytes;
        corrupt[8..12].copy_from_slice(&1000u32.to_le_bytes());
        std::fs::write(&path, &corrupt).unwrap();
        assert!(matches!(TableFormat::read(&path), Err(EmbedError::InvalidFormat(_))));
    }

    #[test]
    fn test_section_sizes_overflow() {
        let header = TableHeader {
            version: VERSION,
            kind: ModelKind::Context,
            dim: u32::MAX,
            num_words: u32::MAX,
            meta_offset: 64,
            index_offset: 64,
            vectors_offset: 64,
            string_pool_offset: 64,
            file_len: 64,
        };
        assert_eq!(section_sizes(&header), None);

        let header = TableHeader {
            dim: 3,
            num_words: 2,
            ..header
        };
        assert_eq!(section_sizes(&header), Some((16, 24)));
    }

    #[test]
    fn test_write_rejects_wrong_dimension() {
        let dir = tempdir().unwrap();
        let (meta, words, mut vectors) = sample();
        vectors[1].push(0.0);
        let result = TableFormat::write(dir.path().join("bad.hrr"), ModelKind::Context, &meta, &words, &vectors);
        assert!(matches!(result, Err(EmbedError::DimensionMismatch { .. })));
    }
}
