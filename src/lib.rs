//! # compass-vertexlist
//!
//! Builds the vertex lists used by compass road networks from the TomTom
//! junction table.
//!
//! ## Usage
//!
//! ```bash
//! compass-vertexlist [--extract] [--page-size N] [--workers N] [--config pipeline.toml]
//! ```
//!
//! ## Modules
//!
//! - `config` - Pipeline configuration and database credentials
//! - `source` - Junction table access (PostgreSQL and an in-memory mock)
//! - `chunk` - Chunk planning, per-chunk extraction and chunk files
//! - `dispatch` - Bounded parallel extraction over all chunks
//! - `merge` - Chunk file discovery and gzip consolidation
//! - `pipeline` - The end-to-end driver
pub mod chunk;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod projection;
pub mod source;
pub mod vertex;

pub use config::PipelineConfig;
pub use error::{ExtractError, ExtractResult};
pub use pipeline::{Pipeline, RunSummary};
pub use projection::ProjectionKind;
