//! The three vertex projections and their file naming

use std::fmt;
use std::path::{Path, PathBuf};

/// One projection of the vertex set. Each is written once per chunk and
/// consolidated into a single gzip output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    /// vertex id → junction id
    Mapping,
    /// full source row plus derived columns
    Lookup,
    /// vertex id → x, y
    Compass,
}

impl ProjectionKind {
    /// Consolidation order
    pub const ALL: [ProjectionKind; 3] = [Self::Mapping, Self::Lookup, Self::Compass];

    /// File name prefix shared by every chunk file of this kind
    pub fn chunk_prefix(&self) -> &'static str {
        match self {
            Self::Mapping => "vertex_mapping_chunk",
            Self::Lookup => "vertex_edge_lookup_chunk",
            Self::Compass => "vertex_chunk",
        }
    }

    /// Chunk file name, e.g. `vertex_chunk_12.csv`
    pub fn chunk_file_name(&self, chunk_index: u64) -> String {
        format!("{}_{}.csv", self.chunk_prefix(), chunk_index)
    }

    /// Column header of the chunk files
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Mapping => &["vertex_id", "junction_id"],
            Self::Lookup => &["junction_id", "geom", "x", "y", "vertex_id"],
            Self::Compass => &["vertex_id", "x", "y"],
        }
    }

    /// Consolidated output file name
    pub fn output_file_name(&self) -> &'static str {
        match self {
            Self::Mapping => "vertices-mapping.csv.gz",
            Self::Lookup => "vertices-complete.csv.gz",
            Self::Compass => "vertices-compass.csv.gz",
        }
    }

    pub fn output_path(&self, condensed_dir: &Path) -> PathBuf {
        condensed_dir.join(self.output_file_name())
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mapping => "mapping",
            Self::Lookup => "lookup",
            Self::Compass => "compass",
        };
        f.write_str(name)
    }
}

/// Paths of the three files written for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPaths {
    pub mapping: PathBuf,
    pub lookup: PathBuf,
    pub compass: PathBuf,
}

impl ChunkPaths {
    pub fn new(vertices_dir: &Path, chunk_index: u64) -> Self {
        Self {
            mapping: vertices_dir.join(ProjectionKind::Mapping.chunk_file_name(chunk_index)),
            lookup: vertices_dir.join(ProjectionKind::Lookup.chunk_file_name(chunk_index)),
            compass: vertices_dir.join(ProjectionKind::Compass.chunk_file_name(chunk_index)),
        }
    }

    /// A chunk counts as done once its compass or mapping file exists.
    /// Contents are not checked.
    pub fn already_written(&self) -> bool {
        self.compass.exists() || self.mapping.exists()
    }
}
