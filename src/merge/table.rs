//! In-memory concatenation of chunk files

use super::manifest::ChunkManifest;
use crate::error::{ExtractError, ExtractResult};
use csv::StringRecord;
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;

/// Rows of every chunk file for one projection, in chunk order. Columns are
/// taken from the first file; every later file must match them exactly.
#[derive(Debug, Clone, Default)]
pub struct ChunkTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    files: usize,
}

impl ChunkTable {
    /// Load every file listed in the manifest
    pub fn load(manifest: &ChunkManifest, progress: &ProgressBar) -> ExtractResult<Self> {
        let mut table = Self::default();
        for path in manifest.paths() {
            table.append_file(path)?;
            progress.inc(1);
        }
        Ok(table)
    }

    /// Append one chunk file's rows
    pub fn append_file(&mut self, path: &Path) -> ExtractResult<()> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ExtractError::csv(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| ExtractError::csv(path, e))?
            .clone();
        if headers.is_empty() {
            return Err(ExtractError::EmptyChunkFile(path.to_path_buf()));
        }

        if self.files == 0 {
            self.headers = headers;
        } else if headers != self.headers {
            return Err(ExtractError::ColumnMismatch {
                path: path.to_path_buf(),
                expected: join_record(&self.headers),
                found: join_record(&headers),
            });
        }

        for record in reader.records() {
            self.rows.push(record.map_err(|e| ExtractError::csv(path, e))?);
        }
        self.files += 1;
        Ok(())
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of files loaded
    pub fn files(&self) -> usize {
        self.files
    }

    /// Write the table as gzip-compressed CSV
    pub fn write_gzip(&self, path: &Path) -> ExtractResult<()> {
        let file = fs::File::create(path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = csv::Writer::from_writer(encoder);

        writer
            .write_record(&self.headers)
            .map_err(|e| ExtractError::csv(path, e))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| ExtractError::csv(path, e))?;
        }

        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?;
        Ok(())
    }
}

fn join_record(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(", ")
}
