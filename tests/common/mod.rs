//! Common test utilities and helpers

use anyhow::Result;
use compass_vertexlist::ProjectionKind;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test context builder for a vertices/condensed directory pair
pub struct TestContextBuilder {
    temp_dir: TempDir,
    chunks: Vec<(u64, Vec<(String, f64, f64)>)>,
    extra_files: Vec<(PathBuf, String)>,
}

impl TestContextBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            chunks: Vec::new(),
            extra_files: Vec::new(),
        })
    }

    /// Add a chunk in all three projections; vertex ids continue from
    /// `index * rows.len()`
    pub fn with_chunk(mut self, index: u64, rows: &[(&str, f64, f64)]) -> Self {
        self.chunks.push((
            index,
            rows.iter()
                .map(|(id, x, y)| (id.to_string(), *x, *y))
                .collect(),
        ));
        self
    }

    /// Add an arbitrary file to the vertices directory
    pub fn with_vertices_file(mut self, name: &str, content: &str) -> Self {
        self.extra_files.push((PathBuf::from(name), content.to_string()));
        self
    }

    pub fn build(self) -> Result<TestContext> {
        let vertices_dir = self.temp_dir.path().join("tomtom-vertices");
        let condensed_dir = self.temp_dir.path().join("tomtom-condensed");
        fs::create_dir_all(&vertices_dir)?;

        for (index, rows) in &self.chunks {
            write_chunk(&vertices_dir, *index, rows)?;
        }
        for (name, content) in &self.extra_files {
            fs::write(vertices_dir.join(name), content)?;
        }

        Ok(TestContext {
            temp_dir: self.temp_dir,
            vertices_dir,
            condensed_dir,
        })
    }
}

/// Directories for one test run
pub struct TestContext {
    temp_dir: TempDir,
    pub vertices_dir: PathBuf,
    pub condensed_dir: PathBuf,
}

impl TestContext {
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output(&self, kind: ProjectionKind) -> PathBuf {
        self.condensed_dir.join(kind.output_file_name())
    }

    /// Decompressed text of a consolidated output
    pub fn read_output(&self, kind: ProjectionKind) -> Result<String> {
        read_gzip(&self.output(kind))
    }
}

pub fn read_gzip(path: &Path) -> Result<String> {
    let mut text = String::new();
    GzDecoder::new(fs::File::open(path)?).read_to_string(&mut text)?;
    Ok(text)
}

fn write_chunk(dir: &Path, index: u64, rows: &[(String, f64, f64)]) -> Result<()> {
    let first_id = index * rows.len() as u64;
    let mut mapping = String::from("vertex_id,junction_id\n");
    let mut lookup = String::from("junction_id,geom,x,y,vertex_id\n");
    let mut compass = String::from("vertex_id,x,y\n");

    for (offset, (junction_id, x, y)) in rows.iter().enumerate() {
        let vertex_id = first_id + offset as u64;
        mapping.push_str(&format!("{vertex_id},{junction_id}\n"));
        lookup.push_str(&format!("{junction_id},POINT ({x} {y}),{x},{y},{vertex_id}\n"));
        compass.push_str(&format!("{vertex_id},{x},{y}\n"));
    }

    fs::write(dir.join(ProjectionKind::Mapping.chunk_file_name(index)), mapping)?;
    fs::write(dir.join(ProjectionKind::Lookup.chunk_file_name(index)), lookup)?;
    fs::write(dir.join(ProjectionKind::Compass.chunk_file_name(index)), compass)?;
    Ok(())
}
