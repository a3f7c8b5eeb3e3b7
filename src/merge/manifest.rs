//! Chunk file discovery
//!
//! A manifest maps chunk index to file for one projection prefix. It is
//! built once per consolidation and is the only place file names are parsed.

use crate::error::{ExtractError, ExtractResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Read the chunk index from a name like `vertex_mapping_chunk_12.csv`:
/// the digits after the last `_` and before `.csv`
pub fn chunk_index_from_file_name(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_suffix(".csv")?;
    let (_, digits) = stem.rsplit_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Chunk files of one projection, keyed by chunk index
#[derive(Debug, Clone)]
pub struct ChunkManifest {
    prefix: String,
    entries: BTreeMap<u64, PathBuf>,
}

impl ChunkManifest {
    /// Scan `dir` for regular files whose name starts with `prefix`
    pub fn scan(dir: &Path, prefix: &str) -> ExtractResult<Self> {
        let mut entries = BTreeMap::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if !file_name.as_encoded_bytes().starts_with(prefix.as_bytes()) {
                continue;
            }

            let path = entry.path();
            let index = file_name
                .to_str()
                .and_then(chunk_index_from_file_name)
                .ok_or_else(|| ExtractError::ChunkName(path.clone()))?;
            if let Some(first) = entries.insert(index, path.clone()) {
                return Err(ExtractError::DuplicateChunk {
                    index,
                    first,
                    second: path,
                });
            }
        }

        Ok(Self {
            prefix: prefix.to_string(),
            entries,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files in ascending chunk order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.values().map(PathBuf::as_path)
    }

    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    /// Indices below the highest one that have no file
    pub fn missing_indices(&self) -> Vec<u64> {
        let Some(&last) = self.entries.keys().next_back() else {
            return Vec::new();
        };
        (0..last).filter(|i| !self.entries.contains_key(i)).collect()
    }
}
