//! Error types for vertex extraction and consolidation

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for extraction and consolidation operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Extraction error types
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source database could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Source query failed
    #[error("Query error: {0}")]
    Query(String),

    /// A geometry value could not be read as a point
    #[error("Invalid geometry for junction {junction_id}: {message}")]
    Geometry {
        junction_id: String,
        message: String,
    },

    /// A chunk file name does not end in `_<index>.csv`
    #[error("Cannot read chunk index from file name {}", .0.display())]
    ChunkName(PathBuf),

    /// Two chunk files resolve to the same index
    #[error("Chunk {index} appears twice: {} and {}", .first.display(), .second.display())]
    DuplicateChunk {
        index: u64,
        first: PathBuf,
        second: PathBuf,
    },

    /// No chunk files matched a prefix
    #[error("No files starting with '{prefix}' found in {}", .dir.display())]
    NoChunkFiles { prefix: String, dir: PathBuf },

    /// A chunk file's columns differ from the first file's columns
    #[error("Columns of {} do not match the first chunk file (expected [{expected}], found [{found}])", .path.display())]
    ColumnMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A chunk file has no header row
    #[error("Chunk file {} is empty", .0.display())]
    EmptyChunkFile(PathBuf),

    /// CSV read or write failed
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more chunks failed during parallel extraction
    #[error("Extraction failed for chunks {failed:?} ({abandoned} chunks not started)")]
    Dispatch { failed: Vec<u64>, abandoned: usize },

    /// Background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

impl ExtractError {
    /// Create a configuration error
    pub fn configuration<E: fmt::Display>(msg: E) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Create a connection error
    pub fn connection<E: fmt::Display>(msg: E) -> Self {
        Self::Connection(msg.to_string())
    }

    /// Create a query error
    pub fn query<E: fmt::Display>(msg: E) -> Self {
        Self::Query(msg.to_string())
    }

    /// Create a geometry error for a junction
    pub fn geometry<J: fmt::Display, E: fmt::Display>(junction_id: J, msg: E) -> Self {
        Self::Geometry {
            junction_id: junction_id.to_string(),
            message: msg.to_string(),
        }
    }

    /// Create a CSV error tied to the file it happened in
    pub fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a task error
    pub fn task<E: fmt::Display>(msg: E) -> Self {
        Self::Task(msg.to_string())
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<sqlx::Error> for ExtractError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                Self::connection(err)
            }
            _ => Self::query(err),
        }
    }
}
