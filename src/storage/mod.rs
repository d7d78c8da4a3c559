//! Storage module: flat binary persistence of trained vector tables.

mod format;

pub use format::{TableFormat, TableHeader, TableMeta, VectorTable, HEADER_SIZE};
