//! Chunked extraction of the junction table
//!
//! - `plan` - row count and chunk arithmetic
//! - `fetcher` - one query per chunk, vertex id assignment
//! - `writer` - the per-chunk projection files

pub mod fetcher;
pub mod plan;
pub mod writer;

pub use fetcher::{ChunkFetcher, FetchOutcome};
pub use plan::{plan_chunks, ChunkPlan};
pub use writer::write_chunk_files;
