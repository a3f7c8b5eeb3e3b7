//! Consolidation of chunk files into gzip outputs
//!
//! Each projection is handled on its own: scan its chunk files, load them
//! all into memory in chunk order, write one compressed CSV, then drop the
//! table before the next projection starts.

pub mod manifest;
pub mod table;

pub use manifest::{chunk_index_from_file_name, ChunkManifest};
pub use table::ChunkTable;

use crate::error::{ExtractError, ExtractResult};
use crate::progress::create_progress_bar;
use crate::projection::ProjectionKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of consolidating one projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationSummary {
    pub kind: ProjectionKind,
    pub files: usize,
    pub rows: usize,
    pub output: PathBuf,
}

/// Concatenate every chunk file starting with `prefix` in `vertices_dir`,
/// ordered by chunk index
pub fn concatenate_chunk_files(
    vertices_dir: &Path,
    prefix: &str,
    show_progress: bool,
) -> ExtractResult<ChunkTable> {
    info!("Reading {} files from {}", prefix, vertices_dir.display());
    let manifest = ChunkManifest::scan(vertices_dir, prefix)?;
    if manifest.is_empty() {
        return Err(ExtractError::NoChunkFiles {
            prefix: prefix.to_string(),
            dir: vertices_dir.to_path_buf(),
        });
    }

    let missing = manifest.missing_indices();
    if !missing.is_empty() {
        warn!(
            "{} files are missing chunk indices {:?}; consolidating what is present",
            prefix, missing
        );
    }

    let progress = create_progress_bar(manifest.len() as u64, prefix, show_progress);
    let table = ChunkTable::load(&manifest, &progress)?;
    progress.finish_and_clear();

    info!("Finished reading {} files ({} rows)", table.files(), table.len());
    Ok(table)
}

/// Consolidate one projection into its gzip output in `condensed_dir`
pub fn consolidate(
    kind: ProjectionKind,
    vertices_dir: &Path,
    condensed_dir: &Path,
    show_progress: bool,
) -> ExtractResult<ConsolidationSummary> {
    let table = concatenate_chunk_files(vertices_dir, kind.chunk_prefix(), show_progress)?;
    let output = kind.output_path(condensed_dir);

    table.write_gzip(&output)?;
    info!("Wrote {} rows to {}", table.len(), output.display());

    Ok(ConsolidationSummary {
        kind,
        files: table.files(),
        rows: table.len(),
        output,
    })
}
