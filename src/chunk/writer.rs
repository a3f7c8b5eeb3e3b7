//! Per-chunk CSV files

use crate::error::{ExtractError, ExtractResult};
use crate::projection::{ChunkPaths, ProjectionKind};
use crate::vertex::Vertex;
use serde::Serialize;
use std::path::Path;

/// Write the three projection files for one chunk.
///
/// The lookup file goes first so that the two files checked for resume
/// are only created after it.
pub fn write_chunk_files(paths: &ChunkPaths, vertices: &[Vertex]) -> ExtractResult<()> {
    write_projection(
        &paths.lookup,
        ProjectionKind::Lookup,
        vertices.iter().map(Vertex::lookup_record),
    )?;
    write_projection(
        &paths.compass,
        ProjectionKind::Compass,
        vertices.iter().map(Vertex::compass_record),
    )?;
    write_projection(
        &paths.mapping,
        ProjectionKind::Mapping,
        vertices.iter().map(Vertex::mapping_record),
    )?;
    Ok(())
}

/// Write one projection. The header is written explicitly so that a chunk
/// with no rows still produces a readable file.
fn write_projection<T, I>(path: &Path, kind: ProjectionKind, records: I) -> ExtractResult<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ExtractError::csv(path, e))?;

    writer
        .write_record(kind.columns())
        .map_err(|e| ExtractError::csv(path, e))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| ExtractError::csv(path, e))?;
    }
    writer.flush()?;
    Ok(())
}
